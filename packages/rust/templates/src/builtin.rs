//! Built-in system instructions and component metadata guidance.

use componentgen_shared::ComponentType;

const ACTION_EXAMPLE: &str = r#"```
export default {
  key: "google_drive-list-all-drives",
  name: "List All Drives",
  description: "Lists all drives in an account.",
  version: "0.0.{{ts}}",
  type: "action",
};
```"#;

const SOURCE_EXAMPLE: &str = r#"```
export default {
  key: "google_drive-new-shared-drive-created",
  name: "New Shared Drive Created",
  description: "Emits a new event any time a shared drive is created.",
  version: "0.0.{{ts}}",
  type: "source",
  dedupe: "unique",
};
```"#;

/// Render the component metadata section around an example and the
/// type-specific properties every component must declare.
fn component_metadata(example: &str, component_type: &str) -> String {
    format!(
        r#"## Component Metadata

Registry components require a unique key and version, and a friendly name and description. E.g.

{example}

Component keys are in the format app_name_slug-slugified-component-name.
You should come up with a name and a description for the component you are generating.
In the description, you should include a link to the app docs, if they exist. Or add this as a placeholder: [See docs here]().
Action keys should use active verbs to describe the action that will occur, (e.g., linear_app-create-issue).
Always add version "0.0.{{ts}}".
Always put {component_type}.
You MUST add metadata to the component code you generate."#
    )
}

pub(crate) fn metadata_guidance(component_type: ComponentType) -> String {
    match component_type {
        ComponentType::Action => component_metadata(ACTION_EXAMPLE, r#""type": "action""#),
        ComponentType::WebhookSource | ComponentType::PollingSource => component_metadata(
            SOURCE_EXAMPLE,
            r#""type": "source" and "dedupe": "unique""#,
        ),
        // App modules are not registry components and carry no key/version.
        ComponentType::App => String::new(),
    }
}

pub(crate) fn system_instructions(component_type: ComponentType) -> &'static str {
    match component_type {
        ComponentType::Action => ACTION_INSTRUCTIONS,
        ComponentType::WebhookSource => WEBHOOK_SOURCE_INSTRUCTIONS,
        ComponentType::PollingSource => POLLING_SOURCE_INSTRUCTIONS,
        ComponentType::App => APP_INSTRUCTIONS,
    }
}

const ACTION_INSTRUCTIONS: &str = "\
You are an agent that writes integration actions as Node.js ES modules.
An action runs once when invoked from a workflow step and returns data to the caller.

Your code must export a default object with the component metadata, a `props`
object declaring the app and every user input, and an async `run({ $ })` method.
Reuse the app file and shared helpers from the existing source provided as context
instead of re-implementing API clients. Call `$.export(\"$summary\", ...)` with a
short human readable summary of what the action did.

Only return the code of the ES module. Do not wrap it in explanations.";

const WEBHOOK_SOURCE_INSTRUCTIONS: &str = "\
You are an agent that writes event sources that receive webhooks, as Node.js ES modules.
A webhook source registers a webhook with the app when deployed, emits one event
per HTTP request it receives, and removes the webhook when deactivated.

Your code must export a default object with the component metadata, `props`
including the app and an `http` interface, `hooks` with `activate` and
`deactivate`, and an async `run(event)` method that calls `this.$emit` with a
unique id, a summary and a timestamp. Reuse the shared source helpers from the
existing source provided as context.

Only return the code of the ES module. Do not wrap it in explanations.";

const POLLING_SOURCE_INSTRUCTIONS: &str = "\
You are an agent that writes polling event sources as Node.js ES modules.
A polling source runs on a timer, fetches new items from the app API since the
last run, and emits one event per new item.

Your code must export a default object with the component metadata, `props`
including the app, a `db` prop and a `timer` prop with a default polling
interval, and an async `run()` method that tracks the last processed item in
`this.db` and calls `this.$emit` with a unique id, a summary and a timestamp.
Reuse the shared source helpers from the existing source provided as context.

Only return the code of the ES module. Do not wrap it in explanations.";

const APP_INSTRUCTIONS: &str = "\
You are an agent that writes the app file of an integration as a Node.js ES module.
The app file declares the app type, its shared `propDefinitions`, and `methods`
that wrap authentication and HTTP requests to the app API so that actions and
sources can reuse them.

Export a default object with `type: \"app\"`, the app slug, `propDefinitions`,
and `methods` including a base URL helper, a header helper using the
connected account credentials, and a generic request method.

Only return the code of the ES module. Do not wrap it in explanations.";
