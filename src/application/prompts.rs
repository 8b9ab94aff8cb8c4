//! Instruction texts sent to the oracle and shown to the operator.

use crate::domain::elicitation::{Column, SchemaDescriptor};

pub const PERIOD_QUESTION: &str = "Which period should the report cover?";
pub const COLUMNS_QUESTION: &str = "Which data do you want to look at?";
pub const CORRECTION_QUESTION: &str = "What should be changed?";
pub const CONFIRM_SUFFIX: &str = "Is this correct? (y/n)";

/// Human-readable name of an elicited field.
pub fn label(field: &str) -> String {
    field.replace('_', " ")
}

/// Shown when the oracle left a value empty without saying why.
pub fn clarification_fallback(field: &str) -> String {
    format!("Could you give more detail about the {}?", label(field))
}

/// System instructions for a structured elicitation call.
pub fn elicitation_system(task: &str, schema: &SchemaDescriptor) -> String {
    format!(
        "{task}\n\
         Use only what the conversation states. When a value cannot be determined, \
         set it to null and use reasoning to ask the user one concrete question.\n\n{}",
        schema.to_prompt_text()
    )
}

pub const PERIOD_TASK: &str = "Identify the reporting period the user is asking for. \
     Resolve relative expressions such as \"last month\" against today's date \
     given in the conversation.";

pub const COLUMNS_TASK: &str = "Identify which columns of the page-analytics data \
     the user wants to see. If the user asks for everything (for example \
     \"すべて\", \"全部\" or \"all\"), return every listed column. Ignore names \
     that are not in the list, such as \"SS数\".";

/// Synthetic instruction opening the column elicitation transcript. The
/// operator's request follows it as a user turn.
pub fn columns_seed() -> String {
    let listing: Vec<String> = Column::ALL
        .iter()
        .map(|c| format!("- {}: {}", c.name(), c.description()))
        .collect();
    format!(
        "The page-analytics data has these columns:\n{}\nThe next message is the user's request.",
        listing.join("\n")
    )
}

/// Listing shown to the operator before the column request.
pub fn columns_menu() -> String {
    let listing: Vec<String> = Column::ALL
        .iter()
        .map(|c| format!("  {}: {}", c.name(), c.description()))
        .collect();
    format!("Available data:\n{}", listing.join("\n"))
}

/// Corrective turn after a rejected candidate.
pub fn corrective(field: &str, reason: &str) -> String {
    format!("The previous {field} answer was rejected: {reason}. Answer again.")
}

/// Corrective turn after an undecodable answer.
pub fn malformed(field: &str, detail: &str) -> String {
    format!(
        "The previous {field} answer could not be read ({detail}). \
         Reply with exactly one JSON object and nothing else."
    )
}

/// Derived turn recording what the oracle proposed.
pub fn proposal(field: &str, raw: &str) -> String {
    format!("Proposed {field}: {}", raw.trim())
}

pub fn rejected_without_comment(field: &str) -> String {
    format!("The user rejected the proposed {field} without further comment.")
}

pub const REPORT_SYSTEM: &str = "You are a web marketing analyst. Write a short \
     access report for the service below: summarise the period's figures, point out \
     notable pages, and suggest concrete improvements. Use Markdown headings.";

pub fn report_instruction(period: &str, service_info: &str, access_data: &str) -> String {
    format!(
        "Reporting period: {period}\n\n## Service\n{service_info}\n\n## Access data\n{access_data}"
    )
}
