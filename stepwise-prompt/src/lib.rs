mod chat;
mod protocol;
mod template;

pub use chat::{ChatPromptTemplate, MessagePromptTemplate};
pub use protocol::{continuation_prompt, continuation_template, step_protocol_system_prompt};
pub use template::PromptTemplate;
