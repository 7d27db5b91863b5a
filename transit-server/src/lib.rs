//! Transit journey planner server.
//!
//! A web application that answers: "I'm standing here at this time,
//! how do I get over there by public transport?"

pub mod domain;
pub mod footpaths;
pub mod planner;
pub mod spatial;
pub mod timetable;
pub mod travel;
pub mod web;
