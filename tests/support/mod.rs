#![allow(dead_code)]

pub mod events;
pub mod provider;
pub mod run;
