mod control;
mod message;
mod runtime;
mod support;
