//! End-to-end tracking through real session files.

mod common;

use common::{assert_in_order, Harness};
use research_core::{
    AgentIdentity, Attribution, ContentBlock, RecordStatus, RuntimeMessage, ToolInvocationEvent, TurnResult,
};
use serde_json::json;

fn delegate(id: &str, subagent: &str, description: &str) -> ContentBlock {
    ContentBlock::tool_use(id, "Task", json!({"subagent_type": subagent, "description": description, "prompt": "..."}))
}

struct Delegation<'a> {
    task_id: &'a str,
    subagent: &'a str,
    lead_text: &'a str,
    description: &'a str,
    tool: &'a str,
    tool_id: &'a str,
    input: serde_json::Value,
    output: serde_json::Value,
}

fn ev_market_plan() -> Vec<Delegation<'static>> {
    vec![
        Delegation {
            task_id: "task_r",
            subagent: "researcher",
            lead_text: "I'll start by gathering market data.",
            description: "Gather EV market data",
            tool: "WebSearch",
            tool_id: "ws_1",
            input: json!({"query": "EV market size 2025"}),
            output: json!("Global EV sales grew 25% year over year"),
        },
        Delegation {
            task_id: "task_d",
            subagent: "data-analyst",
            lead_text: "Research is in. Now the numbers.",
            description: "Chart EV sales",
            tool: "Bash",
            tool_id: "bash_1",
            input: json!({"command": "python charts/ev_sales.py"}),
            output: json!("saved files/charts/ev_sales.png"),
        },
        Delegation {
            task_id: "task_w",
            subagent: "report-writer",
            lead_text: "Charts are ready. Writing the report.",
            description: "Write the EV report",
            tool: "Write",
            tool_id: "write_1",
            input: json!({"file_path": "files/reports/ev_market.md"}),
            output: json!("File written"),
        },
    ]
}

/// Runs the EV market session. With `task_hooks`, the delegation calls also
/// fire hooks, as they do against the real runtime.
fn run_ev_market(harness: &Harness, task_hooks: bool) {
    let tracker = &harness.tracker;
    harness.transcript.write_to_file("\nYou: research the EV market\n");
    harness.transcript.write_with_end("\nAgent: ", "");

    for step in ev_market_plan() {
        let task_input = json!({"subagent_type": step.subagent, "description": step.description, "prompt": "..."});
        harness.processor.process_message(&RuntimeMessage::assistant(vec![
            ContentBlock::text(step.lead_text),
            delegate(step.task_id, step.subagent, step.description),
        ]));
        if task_hooks {
            tracker.on_pre_tool_use(&ToolInvocationEvent::pre("Task", task_input.clone()).with_tool_use_id(step.task_id));
        }

        tracker.on_pre_tool_use(
            &ToolInvocationEvent::pre(step.tool, step.input.clone())
                .with_tool_use_id(step.tool_id)
                .with_parent(step.task_id),
        );
        tracker.on_post_tool_use(
            &ToolInvocationEvent::post(step.tool, step.input.clone(), step.output.clone())
                .with_tool_use_id(step.tool_id)
                .with_parent(step.task_id),
        );

        if task_hooks {
            tracker.on_post_tool_use(
                &ToolInvocationEvent::post("Task", task_input, json!(format!("{} finished", step.subagent)))
                    .with_tool_use_id(step.task_id),
            );
        }
    }

    harness
        .processor
        .process_message(&RuntimeMessage::assistant_text("The report is at files/reports/ev_market.pdf."));
    let result = harness.processor.process_message(&RuntimeMessage::result(TurnResult {
        num_turns: 4,
        ..TurnResult::default()
    }));
    assert_eq!(result.map(|r| r.num_turns), Some(4));
    harness.transcript.write("\n");
    harness.finish();
}

#[test]
fn test_ev_market_three_subagent_records() {
    let harness = Harness::new();
    run_ev_market(&harness, false);

    let records = harness.records();
    assert_eq!(records.len(), 3);
    let agents: Vec<_> = records.iter().map(|r| r.agent.as_str().to_string()).collect();
    assert_eq!(agents, ["researcher", "data-analyst", "report-writer"]);
    let tools: Vec<_> = records.iter().map(|r| r.tool.as_str()).collect();
    assert_eq!(tools, ["WebSearch", "Bash", "Write"]);
    for record in &records {
        assert_eq!(record.status, RecordStatus::Completed);
        assert_eq!(record.attribution, Attribution::Delegated);
        assert!(record.output.is_some());
        assert!(record.duration_ms.is_some());
    }

    let text = harness.transcript_text();
    assert_in_order(
        &text,
        &[
            "You: research the EV market",
            "Agent: I'll start by gathering market data.",
            "→ delegating to researcher: Gather EV market data",
            "[researcher] starting WebSearch",
            "[researcher] completed WebSearch",
            "Research is in. Now the numbers.",
            "→ delegating to data-analyst: Chart EV sales",
            "[data-analyst] starting Bash",
            "[data-analyst] completed Bash",
            "Charts are ready. Writing the report.",
            "→ delegating to report-writer: Write the EV report",
            "[report-writer] starting Write",
            "[report-writer] completed Write",
            "The report is at files/reports/ev_market.pdf.",
        ],
    );
    assert_eq!(text.matches(" starting ").count(), 3);
    assert_eq!(text.matches(" completed ").count(), 3);
}

#[test]
fn test_ev_market_with_delegation_hooks() {
    let harness = Harness::new();
    run_ev_market(&harness, true);

    let records = harness.records();
    assert_eq!(records.len(), 3);
    let agents: Vec<_> = records.iter().map(|r| r.agent.as_str()).collect();
    assert_eq!(agents, ["researcher", "data-analyst", "report-writer"]);
    assert!(records.iter().all(|r| r.agent != AgentIdentity::Lead && r.tool != "Task"));
    assert!(records.iter().all(|r| r.attribution == Attribution::Delegated));

    let text = harness.transcript_text();
    assert_eq!(text.matches("→ delegating to researcher").count(), 1);
    assert_eq!(text.matches("→ delegating to").count(), 3);
    assert!(!text.contains("[lead]"));
    assert_eq!(text.matches(" starting ").count(), 3);
    assert_eq!(text.matches(" completed ").count(), 3);
    assert_eq!(harness.tracker.pending_announcements(), 0);
}

#[tokio::test]
async fn test_consume_stream_with_delegation() {
    let harness = Harness::new();
    let messages = vec![
        Ok::<_, std::io::Error>(RuntimeMessage::assistant(vec![
            ContentBlock::text("Delegating."),
            delegate("task_r", "researcher", "Find sources"),
        ])),
        Ok(RuntimeMessage::subagent("task_r", vec![ContentBlock::text("internal chatter")])),
        Ok(RuntimeMessage::assistant_text(" Done.")),
    ];

    let outcome = harness.processor.consume(futures::stream::iter(messages)).await.unwrap();
    harness.finish();

    assert_eq!(outcome.messages, 3);
    assert_eq!(outcome.tool_uses, 1);
    assert!(outcome.result.is_none());
    let text = harness.transcript_text();
    assert_eq!(text, "Delegating.\n→ delegating to researcher: Find sources\n Done.");
    assert!(!text.contains("internal chatter"));
}
