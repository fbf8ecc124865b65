//! Lead scoring: conversion likelihood and response urgency per lead.

pub mod lead_scoring;

pub use lead_scoring::{score, sort_by_priority, LeadScorer, ScoredLead};
