#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use pos_printer::{
    EpsonDriver, InstructionStream, OFFLINE, PrintError, PrintResult, Printer, PrinterStatus,
    StatusDriver,
};

/// Scripted answer to one status request
#[derive(Debug, Clone, Copy)]
pub enum Answer {
    Online,
    Offline,
    Fail,
}

/// In-memory printer whose behaviour is driven by the test
pub struct ScriptedPrinter {
    name: String,
    width: usize,
    open: AtomicBool,
    pub fail_open: AtomicBool,
    pub fail_close: AtomicBool,
    pub fail_execute: AtomicBool,
    answers: Mutex<VecDeque<Answer>>,
    default_answer: Mutex<Answer>,
    status_delay: Mutex<Option<Duration>>,
    pub opens: AtomicUsize,
    pub closes: AtomicUsize,
    pub fetches: AtomicUsize,
    pub jobs: Mutex<Vec<InstructionStream>>,
}

impl ScriptedPrinter {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            width: 42,
            open: AtomicBool::new(false),
            fail_open: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            fail_execute: AtomicBool::new(false),
            answers: Mutex::new(VecDeque::new()),
            default_answer: Mutex::new(Answer::Online),
            status_delay: Mutex::new(None),
            opens: AtomicUsize::new(0),
            closes: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Queue answers for the next status requests
    pub fn script(&self, answers: &[Answer]) {
        self.answers.lock().unwrap().extend(answers.iter().copied());
    }

    /// Answer once the script is exhausted
    pub fn answer_by_default(&self, answer: Answer) {
        *self.default_answer.lock().unwrap() = answer;
    }

    pub fn delay_status(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = Some(delay);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Printer for ScriptedPrinter {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> usize {
        self.width
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    async fn open(&self) -> PrintResult<()> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(PrintError::Connection(format!("{}: refused", self.name)));
        }
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> PrintResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(PrintError::Offline(self.name.clone()));
        }
        Ok(())
    }

    async fn status(&self) -> PrintResult<PrinterStatus> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.answers.lock().unwrap().pop_front();
        let answer = scripted.unwrap_or_else(|| *self.default_answer.lock().unwrap());
        match answer {
            Answer::Online => Ok(PrinterStatus::new().with(OFFLINE, false)),
            Answer::Offline => Ok(PrinterStatus::new().with(OFFLINE, true)),
            Answer::Fail => Err(PrintError::Timeout(format!("{}: no answer", self.name))),
        }
    }

    async fn execute(&self, printing: InstructionStream) -> PrintResult<()> {
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(PrintError::Offline(self.name.clone()));
        }
        self.jobs.lock().unwrap().push(printing);
        Ok(())
    }

    fn driver(&self) -> &dyn StatusDriver {
        &EpsonDriver
    }
}
