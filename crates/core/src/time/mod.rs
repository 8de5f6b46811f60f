pub mod br_calendar;
