//! The research team: lead system prompt and subagent declarations.

use research_core::{AgentRoster, ModelTier, SubagentDefinition};

pub const LEAD_PROMPT: &str = include_str!("../prompts/lead_agent.txt");
const RESEARCHER_PROMPT: &str = include_str!("../prompts/researcher.txt");
const DATA_ANALYST_PROMPT: &str = include_str!("../prompts/data_analyst.txt");
const REPORT_WRITER_PROMPT: &str = include_str!("../prompts/report_writer.txt");

/// Lead agent system prompt, trimmed.
pub fn lead_prompt() -> &'static str {
    LEAD_PROMPT.trim()
}

/// The three subagents the lead can delegate to.
pub fn roster() -> AgentRoster {
    AgentRoster::new()
        .with_agent(
            SubagentDefinition::new(
                "researcher",
                "Use this agent when you need to gather research information on any topic. \
                 The researcher uses web search to find relevant information, articles, and sources \
                 from across the internet. Writes research findings to files/research_notes/ \
                 for later use by report writers. Ideal for complex research tasks \
                 that require deep searching and cross-referencing.",
            )
            .with_tools(["WebSearch", "Write"])
            .with_prompt(RESEARCHER_PROMPT.trim())
            .with_model(ModelTier::Haiku),
        )
        .with_agent(
            SubagentDefinition::new(
                "data-analyst",
                "Use this agent AFTER researchers have completed their work to generate quantitative \
                 analysis and visualizations. The data-analyst reads research notes from files/research_notes/, \
                 extracts numerical data (percentages, rankings, trends, comparisons), and generates \
                 charts using Python/matplotlib via Bash. Saves charts to files/charts/ and writes \
                 a data summary to files/data/. Use this before the report-writer to add visual insights.",
            )
            .with_tools(["Glob", "Read", "Bash", "Write"])
            .with_prompt(DATA_ANALYST_PROMPT.trim())
            .with_model(ModelTier::Haiku),
        )
        .with_agent(
            SubagentDefinition::new(
                "report-writer",
                "Use this agent when you need to create a formal research report document. \
                 The report-writer reads research findings from files/research_notes/, data analysis \
                 from files/data/, and charts from files/charts/, then synthesizes them into clear, \
                 concise, professionally formatted PDF reports in files/reports/ using reportlab. \
                 Does NOT conduct web searches - only reads existing research notes and creates PDF reports.",
            )
            .with_tools(["Skill", "Write", "Glob", "Read", "Bash"])
            .with_prompt(REPORT_WRITER_PROMPT.trim())
            .with_model(ModelTier::Haiku),
        )
}
