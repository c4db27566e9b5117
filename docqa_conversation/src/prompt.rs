//! Prompt templating with a closed set of placeholders.
//!
//! Templates use `{snippets}`, `{history}` and `{input}`. `{{` and `}}`
//! produce literal braces. Any other placeholder is rejected when the
//! template is parsed, so a bad template never reaches a model call.

use std::collections::HashMap;

use docqa_core::{HISTORY_KEY, INPUT_KEY, MemorySource, SNIPPETS_KEY, TemplateError};

const KNOWN_PLACEHOLDERS: [&str; 3] = [SNIPPETS_KEY, HISTORY_KEY, INPUT_KEY];

pub const DEFAULT_PROMPT_TEMPLATE: &str = "\
You are an expert, tasked with helping customers with their questions. They will ask you \
questions and provide technical snippets that may or may not contain the answer, and it's your \
job to find the answer if possible, while taking into account the entire conversation context.
The following snippets can be used to help you answer the questions:
{snippets}
The following is a friendly conversation between a customer and you. Please answer the \
customer's needs based on the provided snippets and the conversation history. Make sure to take \
the previous messages in consideration, as they contain additional context.
If the provided snippets don't include the answer, please say so, and don't try to make up an \
answer instead. Include in your reply the title of the document and the page from where your \
answer is coming from, if applicable.

{history}
Customer: {input}
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(&'static str),
}

/// A parsed prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.char_indices().peekable();

        while let Some((position, c)) = chars.next() {
            match c {
                '{' if chars.peek().is_some_and(|&(_, next)| next == '{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek().is_some_and(|&(_, next)| next == '}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for (_, inner) in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return Err(TemplateError::UnclosedBrace(position)),
                            other => name.push(other),
                        }
                    }
                    if !closed {
                        return Err(TemplateError::UnclosedBrace(position));
                    }
                    if name.trim().is_empty() {
                        return Err(TemplateError::EmptyPlaceholder(position));
                    }
                    let Some(known) = KNOWN_PLACEHOLDERS.iter().find(|k| **k == name) else {
                        return Err(TemplateError::UnknownPlaceholder { name, position });
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(*known));
                }
                '}' => return Err(TemplateError::UnmatchedClosingBrace(position)),
                other => literal.push(other),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Placeholders referenced by the template, in order of appearance.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&'static str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Placeholder(name) => Some(*name),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Fill the template. Placeholders without a value render empty.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, String>) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Placeholder(name) => values.get(name).map_or("", String::as_str),
            })
            .collect()
    }

    /// Fill the template from memory sources and the current user input.
    #[must_use]
    pub fn assemble(&self, sources: &[&dyn MemorySource], input: &str) -> String {
        let mut values: HashMap<&str, String> = sources
            .iter()
            .map(|source| (source.memory_key(), source.load()))
            .collect();
        values.insert(INPUT_KEY, input.to_string());
        self.render(&values)
    }
}

impl Default for PromptTemplate {
    #[expect(
        clippy::expect_used,
        reason = "Built-in template is covered by tests"
    )]
    fn default() -> Self {
        Self::parse(DEFAULT_PROMPT_TEMPLATE).expect("Built-in prompt template is valid")
    }
}

/// Parse `template` and fill it in one step.
pub fn assemble(
    template: &str,
    snippets: &str,
    history: &str,
    input: &str,
) -> Result<String, TemplateError> {
    let template = PromptTemplate::parse(template)?;
    let values = HashMap::from([
        (SNIPPETS_KEY, snippets.to_string()),
        (HISTORY_KEY, history.to_string()),
        (INPUT_KEY, input.to_string()),
    ]);
    Ok(template.render(&values))
}
