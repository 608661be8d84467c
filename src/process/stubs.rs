use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::process::{CommandError, CommandOutput, CommandRunner, Invocation};

#[derive(Clone, Debug)]
pub enum Reply {
    Exit { code: i32, stdout: String },
    NotFound,
}

impl Reply {
    pub fn ok(stdout: &str) -> Reply {
        Reply::Exit {
            code: 0,
            stdout: stdout.to_owned(),
        }
    }

    pub fn fail(code: i32) -> Reply {
        Reply::Exit {
            code,
            stdout: String::new(),
        }
    }
}

struct Rule {
    prefix: String,
    replies: VecDeque<Reply>,
}

/// Records every invocation and answers from scripted replies.
///
/// A rule matches when the command line starts with its prefix; the first
/// matching rule wins. Replies are consumed in order and the last one repeats.
/// Commands without a matching rule succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new() -> ScriptedRunner {
        ScriptedRunner::default()
    }

    pub fn on(self, prefix: &str, replies: Vec<Reply>) -> ScriptedRunner {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                prefix: prefix.to_owned(),
                replies: replies.into(),
            });
        }
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    fn next_reply(&self, command_line: &str) -> Reply {
        let mut rules = self.rules.lock().unwrap();
        match rules
            .iter_mut()
            .find(|rule| command_line.starts_with(&rule.prefix))
        {
            Some(rule) if rule.replies.len() > 1 => rule.replies.pop_front().unwrap(),
            Some(rule) => rule.replies.front().cloned().unwrap_or_else(|| Reply::ok("")),
            None => Reply::ok(""),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput, CommandError> {
        self.calls.lock().unwrap().push(invocation.clone());
        match self.next_reply(&invocation.to_string()) {
            Reply::Exit { code, stdout } => Ok(CommandOutput {
                code: Some(code),
                stdout,
                stderr: String::new(),
            }),
            Reply::NotFound => Err(CommandError::NotFound {
                program: invocation.program.clone(),
            }),
        }
    }
}
