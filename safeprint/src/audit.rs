//! Audit recording.
//!
//! An [`AuditRecorder`] renders request, response and error payloads through a
//! [`Printer`] and hands one finished line to an [`AuditSink`]. Sinks only
//! accept text; where that text goes (file, bus, console) is up to them.

use std::sync::{Arc, Mutex, PoisonError};

use crate::{printer::Printer, value::ToValue};

/// Accepts finished audit lines.
pub trait AuditSink {
    fn accept(&self, line: &str);
}

impl<S: AuditSink + ?Sized> AuditSink for &S {
    fn accept(&self, line: &str) {
        (**self).accept(line);
    }
}

impl<S: AuditSink + ?Sized> AuditSink for Arc<S> {
    fn accept(&self, line: &str) {
        (**self).accept(line);
    }
}

/// In-memory capture. A poisoned buffer keeps accepting lines.
impl AuditSink for Mutex<Vec<String>> {
    fn accept(&self, line: &str) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
    }
}

/// Outcome of an audited operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Failed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Failed => "failed",
        }
    }
}

/// Renders operation payloads and forwards them to a sink.
#[derive(Clone, Debug)]
pub struct AuditRecorder<S> {
    printer: Printer,
    sink: S,
}

impl<S: AuditSink> AuditRecorder<S> {
    pub fn new(printer: Printer, sink: S) -> Self {
        Self { printer, sink }
    }

    pub fn printer(&self) -> &Printer {
        &self.printer
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Records a completed operation.
    pub fn record_success<Req, Resp>(&self, operation: &str, request: &Req, response: &Resp)
    where
        Req: ToValue + ?Sized,
        Resp: ToValue + ?Sized,
    {
        self.emit(
            operation,
            Outcome::Ok,
            request,
            ("response", &self.printer.sanitize(response)),
        );
    }

    /// Records a failed operation. The error goes through the printer too, since
    /// error payloads often echo their input.
    pub fn record_failure<Req, Err>(&self, operation: &str, request: &Req, error: &Err)
    where
        Req: ToValue + ?Sized,
        Err: ToValue + ?Sized,
    {
        self.emit(
            operation,
            Outcome::Failed,
            request,
            ("error", &self.printer.sanitize(error)),
        );
    }

    fn emit<Req: ToValue + ?Sized>(
        &self,
        operation: &str,
        outcome: Outcome,
        request: &Req,
        (label, payload): (&str, &str),
    ) {
        let line = format!(
            "operation={operation} outcome={} request={} {label}={payload}",
            outcome.as_str(),
            self.printer.sanitize(request),
        );
        self.sink.accept(&line);
    }
}
