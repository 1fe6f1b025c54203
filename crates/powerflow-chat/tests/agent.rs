mod common;

use std::sync::Arc;

use common::{call, text, FakePowerflow, ScriptedModel};
use powerflow_chat::{Agent, ChatError, ChatMessage, Role, ToolRegistry};
use serde_json::json;

fn registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FakePowerflow));
    Arc::new(registry)
}

#[tokio::test]
async fn plain_answer_needs_one_model_call() {
    let model = ScriptedModel::new(vec![text("Hello, engineer.")]);
    let agent = Agent::new(model.clone(), registry());
    let mut history = Vec::new();

    let reply = agent.respond(&mut history, "hi").await.unwrap();
    assert_eq!(reply.reply, "Hello, engineer.");
    assert!(reply.tool_calls.is_empty());
    assert_eq!(history, vec![ChatMessage::user("hi"), ChatMessage::assistant("Hello, engineer.")]);

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0][0], ChatMessage::system("You are a expert in power system."));
}

#[tokio::test]
async fn tool_results_are_fed_back() {
    let model = ScriptedModel::new(vec![
        call("c1", "powerflow__run_pf", json!({"network": "case9"})),
        call("c2", "powerflow__analysis_pf_result", json!({"network": "case9"})),
        text("Voltages stay between 0.95 and 1.0 p.u."),
    ]);
    let agent = Agent::new(model.clone(), registry());
    let mut history = Vec::new();

    let reply = agent
        .respond(&mut history, "Solve case9 and plot the profile")
        .await
        .unwrap();
    assert_eq!(reply.reply, "Voltages stay between 0.95 and 1.0 p.u.");
    assert_eq!(reply.tool_calls.len(), 2);
    assert_eq!(reply.tool_calls[0].name, "powerflow__run_pf");
    assert!(reply.tool_calls[0].output.contains("completed successfully"));
    assert_eq!(reply.images.len(), 1);

    // user, (assistant call, tool result) x2, final answer
    assert_eq!(history.len(), 6);
    assert_eq!(history[2].role, Role::Tool);
    assert_eq!(history[2].tool_call_id.as_deref(), Some("c1"));
    assert_eq!(history[4].content.as_deref(), Some("[1 image(s) shown to the user]"));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(prompts[2].len(), 6); // system + five history entries
}

#[tokio::test]
async fn unknown_tool_is_reported_to_the_model() {
    let model = ScriptedModel::new(vec![
        call("c1", "powerflow__delete_everything", json!({})),
        text("That tool does not exist."),
    ]);
    let agent = Agent::new(model, registry());
    let mut history = Vec::new();

    let reply = agent.respond(&mut history, "do it").await.unwrap();
    assert!(reply.tool_calls[0].is_error);
    assert!(reply.tool_calls[0].output.starts_with("Error: Unknown tool"));
}

#[tokio::test]
async fn too_many_tool_rounds_fail_and_keep_history() {
    let model = ScriptedModel::new(vec![
        call("c1", "powerflow__get_available_networks", json!({})),
        call("c2", "powerflow__get_available_networks", json!({})),
        call("c3", "powerflow__get_available_networks", json!({})),
    ]);
    let agent = Agent::new(model, registry()).with_max_tool_rounds(2);
    let mut history = vec![ChatMessage::user("earlier"), ChatMessage::assistant("reply")];

    let err = agent.respond(&mut history, "loop forever").await.unwrap_err();
    assert!(matches!(err, ChatError::ToolRounds(2)));
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn model_failure_propagates() {
    let model = ScriptedModel::new(Vec::new());
    let agent = Agent::new(model, registry());
    let mut history = Vec::new();
    assert!(matches!(
        agent.respond(&mut history, "hi").await.unwrap_err(),
        ChatError::EmptyResponse
    ));
    assert!(history.is_empty());
}

#[tokio::test]
async fn history_carries_across_turns() {
    let model = ScriptedModel::new(vec![text("first"), text("second")]);
    let agent = Agent::new(model.clone(), registry()).with_system_prompt("");
    let mut history = Vec::new();

    agent.respond(&mut history, "one").await.unwrap();
    agent.respond(&mut history, "two").await.unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts[1].len(), 3);
    assert_eq!(prompts[1][0], ChatMessage::user("one"));
}
