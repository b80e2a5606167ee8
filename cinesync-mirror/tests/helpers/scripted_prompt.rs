//! Confirmation prompt answering from a script

use async_trait::async_trait;
use cinesync_mirror::services::Confirm;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub type QuestionLog = Arc<Mutex<Vec<String>>>;

/// Answers in order; declines once the script runs out
pub struct ScriptedPrompt {
    answers: VecDeque<bool>,
    questions: QuestionLog,
}

impl ScriptedPrompt {
    pub fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            questions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn question_log(&self) -> QuestionLog {
        self.questions.clone()
    }
}

#[async_trait]
impl Confirm for ScriptedPrompt {
    async fn confirm(&mut self, question: &str) -> std::io::Result<bool> {
        self.questions.lock().unwrap().push(question.to_string());
        Ok(self.answers.pop_front().unwrap_or(false))
    }
}
