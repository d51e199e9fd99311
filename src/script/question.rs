use crate::{Result, SoundboardError};
use serde::{Deserialize, Serialize};

/// Placeholder printed where an object is referenced
pub const BLANK: &str = "___________";

/// A question split into text fragments around object references.
///
/// `n` fragments leave `n - 1` blanks; fragment `i` is spoken before the robot
/// turns to the `i`-th referenced object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Question {
    fragments: Vec<String>,
}

impl Question {
    pub fn new<I, S>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fragments: Vec<String> = fragments.into_iter().map(Into::into).collect();
        if fragments.is_empty() {
            return Err(SoundboardError::ConfigError(
                "a question needs at least one fragment".into(),
            ));
        }
        Ok(Self { fragments })
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Number of objects the question refers to
    pub fn blanks(&self) -> usize {
        self.fragments.len() - 1
    }

    /// Fragments joined without blanks, as listed in the menu
    pub fn text(&self) -> String {
        self.fragments.concat()
    }

    /// Fragments joined with a visible blank for each object reference
    pub fn with_blanks(&self) -> String {
        self.fragments.join(BLANK)
    }

    /// Fragment spoken after the last object, if it has anything to say
    pub fn spoken_tail(&self) -> Option<&str> {
        let tail = self.fragments.last()?;
        tail.chars()
            .any(char::is_alphanumeric)
            .then_some(tail.as_str())
    }
}

impl TryFrom<Vec<String>> for Question {
    type Error = SoundboardError;

    fn try_from(fragments: Vec<String>) -> Result<Self> {
        Self::new(fragments)
    }
}

impl From<Question> for Vec<String> {
    fn from(question: Question) -> Self {
        question.fragments
    }
}

/// The questions and statements available to the operator
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub questions: Vec<Question>,
    pub statements: Vec<String>,
}

impl Default for Script {
    fn default() -> Self {
        Self::experiment()
    }
}

impl Script {
    pub fn new(questions: Vec<Question>, statements: Vec<String>) -> Self {
        Self {
            questions,
            statements,
        }
    }

    /// Script used in the object description study
    pub fn experiment() -> Self {
        let questions: &[&[&str]] = &[
            &["What is this", "?"],
            &["Where is the ", "."],
            &[
                "Can you describe this",
                " and show me an object that is similarly sized?",
            ],
            &["Could you place this", " next to that", "."],
            &["Can you tell me more about this", "?"],
            &["What would you use this object for", "?"],
            &["How are this ", "and that similar", "?"],
            &["How would you describe this", "?"],
            &["How would you use this", "?"],
            &["Can you describe one of the objects that you would use everyday?"],
            &["How is this ", " different from that", "?"],
            &["Could you sort all the objects by how useful you would find them?"],
        ];

        Self {
            questions: questions
                .iter()
                .map(|fragments| Question {
                    fragments: fragments.iter().map(|f| f.to_string()).collect(),
                })
                .collect(),
            statements: vec!["yes".into(), "no".into(), "here".into()],
        }
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn statement(&self, index: usize) -> Option<&str> {
        self.statements.get(index).map(String::as_str)
    }
}
