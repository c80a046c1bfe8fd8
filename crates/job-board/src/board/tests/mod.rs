mod common;

mod coordinator;
