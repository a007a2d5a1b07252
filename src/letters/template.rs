use futures_util::future::BoxFuture;

use super::{format_amount, LetterError, LetterFields, LetterGenerator};
use crate::models::LetterSource;

/// Fixed appeal letter filled in from the claim.
pub struct TemplateGenerator;

pub fn render_template(fields: &LetterFields) -> String {
    format!(
        "Dear Claims Review Department,\n\n\
         I am writing to formally appeal the denial of claim {id} for patient {patient}, dated {denied}.\n\n\
         The claim in the amount of ${amount} was denied for the following reason: \"{reason}\".\n\n\
         After careful review, we believe this denial should be reconsidered as the service was medically necessary.\n\n\
         Sincerely,\n\
         ClaimRx Medical Billing",
        id = fields.id,
        patient = fields.patient,
        denied = fields.denied_date,
        amount = format_amount(fields.amount),
        reason = fields.denial_reason,
    )
}

impl LetterGenerator for TemplateGenerator {
    fn generate<'a>(&'a self, fields: &'a LetterFields) -> BoxFuture<'a, Result<String, LetterError>> {
        Box::pin(async move { Ok(render_template(fields)) })
    }

    fn source(&self) -> LetterSource {
        LetterSource::Template
    }
}
