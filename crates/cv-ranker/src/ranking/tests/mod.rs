mod common;
mod extraction;
mod session;
