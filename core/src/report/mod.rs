pub mod extract;
pub mod pdf;

pub use extract::{
    DayMarkers, Days, ItineraryDay, PlanCheck, PlanView, TripSummary, check_plan, extract_field,
    extract_section, parse_days,
};
pub use pdf::{PdfOptions, to_latin1_lossy, render_pdf, write_pdf};
