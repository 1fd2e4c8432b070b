use sentinel_core::{JobRequest, OfferingRegistry};
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use crate::cli::{RequestArgs, RunArgs};
use crate::error::CliError;

use super::{CommandOutput, Outcome};

fn parse_request(raw: &str) -> Result<JobRequest, CliError> {
    let request: Value = serde_json::from_str(raw)?;
    if !request.is_object() {
        return Err(CliError::Command(String::from(
            "--request must be a JSON object",
        )));
    }
    Ok(request)
}

pub fn validate(args: &RequestArgs, registry: &OfferingRegistry) -> Result<CommandOutput, CliError> {
    let offering = registry.require(&args.offering)?;
    let request = parse_request(&args.request)?;

    let validation = offering.validate_requirements(&request);
    let outcome = if validation.valid {
        Outcome::Success
    } else {
        Outcome::Rejected
    };
    Ok(CommandOutput::json(&serde_json::to_value(&validation)?)?.with_outcome(outcome))
}

pub fn payment(args: &RequestArgs, registry: &OfferingRegistry) -> Result<CommandOutput, CliError> {
    let offering = registry.require(&args.offering)?;
    let request = parse_request(&args.request)?;

    Ok(CommandOutput::success(offering.request_payment(&request)))
}

pub async fn run(args: &RunArgs, registry: &OfferingRegistry) -> Result<CommandOutput, CliError> {
    let offering = registry.require(&args.target.offering)?;
    let request = parse_request(&args.target.request)?;

    let job_id = Uuid::new_v4();
    let span = tracing::info_span!("job", %job_id, offering = offering.name());
    let result = offering.execute_job(&request).instrument(span).await;

    let outcome = match result.error_code() {
        Some(code) => {
            tracing::warn!(%job_id, code = %code, "job produced an error deliverable");
            Outcome::DeliverableError
        }
        None => Outcome::Success,
    };

    let text = if args.pretty {
        serde_json::to_string_pretty(&result.to_value()?)?
    } else {
        result.deliverable
    };
    Ok(CommandOutput::success(text).with_outcome(outcome))
}
