use plancheck_core::error::QcError;
use plancheck_core::reconcile::QcReport;

pub fn print(report: &QcReport) -> Result<(), QcError> {
    let json = serde_json::to_string_pretty(report)?;
    println!("{json}");
    Ok(())
}
