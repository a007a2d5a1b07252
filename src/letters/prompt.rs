use super::{format_amount, LetterFields};

const INSTRUCTIONS: &str = "You are a medical billing specialist writing a formal insurance claim \
appeal letter. Write a compelling, professional appeal letter using the following claim details. \
The letter should:\n\n\
1. Cite specific medical necessity arguments relevant to the denial reason\n\
2. Reference applicable CPT/ICD-10 codes and clinical guidelines when provided\n\
3. Address the specific denial reason with targeted counter-arguments\n\
4. Follow standard appeal letter formatting for the specific payer\n\
5. Include references to relevant payer policy sections where applicable\n\
6. Be persuasive but professional in tone";

const CLOSING: &str =
    "Write the appeal letter now. Do not include any preamble or explanation - just the letter itself.";

/// Build the single user message sent to the model.
pub fn build_letter_prompt(fields: &LetterFields) -> String {
    let mut details = vec![
        format!("- Claim ID: {}", fields.id),
        format!("- Patient: {}", fields.patient),
        format!("- Amount: ${}", format_amount(fields.amount)),
        format!("- Payer: {}", fields.payer),
        format!("- Denial Reason: {}", fields.denial_reason),
        format!("- Denied Date: {}", fields.denied_date),
        format!("- Deadline: {}", fields.deadline.as_deref().unwrap_or("")),
    ];

    let optional = [
        ("CPT Code", &fields.service_code),
        ("ICD-10 Code", &fields.diagnosis_code),
        ("Service Date", &fields.service_date),
    ];
    for (label, value) in optional {
        if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            details.push(format!("- {label}: {v}"));
        }
    }

    format!(
        "{INSTRUCTIONS}\n\nClaim Details:\n{}\n\n{CLOSING}",
        details.join("\n")
    )
}
