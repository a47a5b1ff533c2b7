//! Test-only generators that return predetermined completions.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};

use crate::io::generator::{GenerateRequest, Generator, PromptKind};

/// One scripted reply, consumed in order.
#[derive(Debug, Clone)]
pub enum Reply {
    Text { kind: PromptKind, text: String },
    Fail { kind: PromptKind, message: String },
}

impl Reply {
    pub fn text(kind: PromptKind, text: impl Into<String>) -> Self {
        Reply::Text {
            kind,
            text: text.into(),
        }
    }

    pub fn fail(kind: PromptKind, message: impl Into<String>) -> Self {
        Reply::Fail {
            kind,
            message: message.into(),
        }
    }

    fn kind(&self) -> PromptKind {
        match self {
            Reply::Text { kind, .. } | Reply::Fail { kind, .. } => *kind,
        }
    }
}

/// Generator that replays a fixed queue of replies and records every request.
///
/// A request whose kind does not match the next reply is an error, so tests
/// also assert the order in which steps call the port.
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedGenerator {
    pub fn new(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Script for a topic classified as `classification` and answered directly.
    pub fn direct(classification: &str, answer: &str) -> Self {
        Self::new(vec![
            Reply::text(PromptKind::Classify, classification),
            Reply::text(PromptKind::DirectAnswer, answer),
        ])
    }

    /// Script for a full debate of `max_rounds` rounds plus a verdict.
    pub fn debate(max_rounds: u32) -> Self {
        Self::new(debate_replies(max_rounds))
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Replies not consumed yet.
    pub fn remaining(&self) -> usize {
        self.replies.lock().expect("replies lock").len()
    }
}

/// Replies for a debatable topic: classifier, `max_rounds` turn pairs, verdict.
pub fn debate_replies(max_rounds: u32) -> Vec<Reply> {
    let mut replies = vec![Reply::text(PromptKind::Classify, "debatable")];
    for round in 1..=max_rounds {
        replies.push(Reply::text(
            PromptKind::Proponent,
            format!("pro argument {round}"),
        ));
        replies.push(Reply::text(
            PromptKind::Opponent,
            format!("con argument {round}"),
        ));
    }
    replies.push(Reply::text(PromptKind::Judge, "The proponent wins."));
    replies
}

impl Generator for ScriptedGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        let reply = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .ok_or_else(|| anyhow!("script exhausted at {} prompt", request.kind))?;
        if reply.kind() != request.kind {
            bail!(
                "expected {} prompt, got {} prompt",
                reply.kind(),
                request.kind
            );
        }
        match reply {
            Reply::Text { text, .. } => Ok(text),
            Reply::Fail { message, .. } => Err(anyhow!(message)),
        }
    }
}

/// Stateless generator for concurrent runs: classifies by looking up which
/// known topic the prompt mentions and returns canned text for other steps.
#[derive(Debug, Clone, Default)]
pub struct KeyedGenerator {
    classifications: BTreeMap<String, String>,
}

impl KeyedGenerator {
    pub fn new<I, T, C>(classifications: I) -> Self
    where
        I: IntoIterator<Item = (T, C)>,
        T: Into<String>,
        C: Into<String>,
    {
        Self {
            classifications: classifications
                .into_iter()
                .map(|(topic, class)| (topic.into(), class.into()))
                .collect(),
        }
    }
}

impl Generator for KeyedGenerator {
    fn generate(&self, request: &GenerateRequest) -> Result<String> {
        match request.kind {
            PromptKind::Classify => self
                .classifications
                .iter()
                .find(|(topic, _)| request.prompt.contains(topic.as_str()))
                .map(|(_, class)| class.clone())
                .ok_or_else(|| anyhow!("no classification scripted for prompt")),
            PromptKind::DirectAnswer => Ok("A direct answer.".to_string()),
            PromptKind::Proponent => Ok("An argument for.".to_string()),
            PromptKind::Opponent => Ok("An argument against.".to_string()),
            PromptKind::Judge => Ok("A verdict.".to_string()),
        }
    }
}
