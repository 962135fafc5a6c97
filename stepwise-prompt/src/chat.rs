use std::collections::HashMap;

use crate::PromptTemplate;
use stepwise_core::{Message, Role, StepwiseError, TryFromValue, Value};

#[derive(Debug, Clone)]
pub enum MessagePromptTemplate {
    Human(PromptTemplate),
    AI(PromptTemplate),
    System(PromptTemplate),
    Placeholder { variable_name: String },
}

impl MessagePromptTemplate {
    pub fn human(template: &str) -> Self {
        Self::Human(PromptTemplate::new(template.to_string()))
    }

    pub fn ai(template: &str) -> Self {
        Self::AI(PromptTemplate::new(template.to_string()))
    }

    pub fn system(template: &str) -> Self {
        Self::System(PromptTemplate::new(template.to_string()))
    }

    pub fn placeholder(variable_name: &str) -> Self {
        Self::Placeholder {
            variable_name: variable_name.to_string(),
        }
    }

    pub fn format(&self, vars: &HashMap<String, Value>) -> Result<Vec<Message>, StepwiseError> {
        match self {
            MessagePromptTemplate::Human(t) => Ok(vec![Message::new(Role::User, t.render(vars)?)]),
            MessagePromptTemplate::AI(t) => {
                Ok(vec![Message::new(Role::Assistant, t.render(vars)?)])
            }
            MessagePromptTemplate::System(t) => {
                Ok(vec![Message::new(Role::System, t.render(vars)?)])
            }
            MessagePromptTemplate::Placeholder { variable_name } => match vars.get(variable_name) {
                // A placeholder holds either a list of turns or a single turn.
                Some(value @ Value::Array(_)) => Vec::<Message>::try_from_value(value.clone()),
                Some(value) => Ok(vec![Message::try_from_value(value.clone())?]),
                None => Ok(vec![]),
            },
        }
    }
}

/// An ordered conversation skeleton, e.g. a few-shot prompt.
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<MessagePromptTemplate>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<MessagePromptTemplate>) -> Self {
        Self { messages }
    }

    pub fn format_messages(
        &self,
        vars: &HashMap<String, Value>,
    ) -> Result<Vec<Message>, StepwiseError> {
        let mut result = Vec::new();
        for tmpl in &self.messages {
            result.extend(tmpl.format(vars)?);
        }
        Ok(result)
    }
}
