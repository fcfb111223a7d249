// Prompt template for grievance analysis.
// The schema block is the contract `response::decode_result` relies on.

use crate::analysis::models::GrievanceInput;

/// Placeholder for optional fields so the model never infers over a missing token.
pub const NOT_SPECIFIED: &str = "Not specified";

/// Analysis prompt template.
/// Replace: {category}, {location}, {department}, {description}
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are VoiceMyIssue, an expert AI Grievance Redressal Consultant.
Your task is to analyze a consumer or civic grievance and provide structured, actionable advice.

User Input:
- Category: {category}
- Location: {location}
- Department/Entity: {department}
- Description: "{description}"

CRITICAL INSTRUCTION: LANGUAGE MATCHING
1. DETECT the language of the "Description" field (English, Hindi, or Hinglish).
2. GENERATE ALL OUTPUTS (Analysis, Recommendations, Trade-offs, Drafts, etc.) IN THAT EXACT SAME LANGUAGE.
3. EXCEPTION: The 'simplifiedExplanation' field must still provide all 3 versions (en, hi, hinglish). All other fields must match the user's input language.
4. If the input is Hinglish, the output must be natural, conversational Hinglish.
5. If the input is Hindi, use clear, simple Hindi (avoid complex legal Sanskritized Hindi).

Follow this EXACT 7-step pipeline:

STEP 1: Understand the grievance
- Detect the specific type of issue.
- Extract key entities.
- Identify intent (Refund, Resolution, Escalation, etc.).
- DETECT SEVERITY/URGENCY: Classify as "Low", "Medium", or "High" based on safety risks, financial loss magnitude, or time sensitivity. Provide a brief reason.

STEP 2: Generate Action Options (Minimum 3)
- Provide at least 3 distinct, valid paths (e.g., Internal Complaint, Government Portal, Consumer Court, Social Media Escalation, Ombudsman).
- Give every option a short unique "id".
- For each, list Pros and Cons.

STEP 3: Compare Options
- Evaluate based on Efficiency, Authority, Effort, and Suitability.

STEP 4: Best-Fit Recommendation, Confidence & Empathy
- Select the SINGLE best option. "actionId" MUST be the "id" of one of the options from STEP 2.
- Explain WHY it is the best for this specific user/situation.
- TRADEOFF ANALYSIS: Briefly explain why other valid options were NOT selected.
- CONFIDENCE SCORE: Assign "Low", "Medium", or "High".
- EMPATHETIC PATH: Write a short section titled "If I were in your situation...". Use first-person ("I would..."), supportive, non-authoritative language. No legal jargon. Focus on reducing anxiety.
- SIMPLIFIED EXPLANATION: Rewrite the recommendation in very simple terms for a non-technical person (e.g. a parent). Provide 3 versions: "en" (English), "hi" (Hindi - Devanagari), "hinglish" (Hindi+English mix).

STEP 5: Complaint Draft Generation
- Generate a professional, formal complaint draft.

STEP 6: Evidence Checklist
- Generate a specific list of documents.

STEP 7: Risk Flagging & Submission
- Identify missing info.
- Flag weak arguments.
- Where to submit.

Output strictly in this JSON format:
{
  "analysis": {
    "issueType": "string",
    "intent": "string",
    "entities": ["string"],
    "urgency": {
      "level": "Low" | "Medium" | "High",
      "reason": "string"
    }
  },
  "actions": [
    {
      "id": "string",
      "title": "string",
      "description": "string",
      "pros": ["string"],
      "cons": ["string"]
    }
  ],
  "recommendation": {
    "actionId": "string",
    "reason": "string",
    "tradeoffAnalysis": "string",
    "confidence": {
      "level": "Low" | "Medium" | "High",
      "reason": "string"
    },
    "empatheticPath": "string",
    "simplifiedExplanation": {
      "en": "string",
      "hi": "string",
      "hinglish": "string"
    }
  },
  "evidenceChecklist": ["string"],
  "draft": {
    "subject": "string",
    "body": "string"
  },
  "risks": ["string"],
  "submissionGuide": {
    "authorityName": "string",
    "method": "string",
    "timeline": "string",
    "escalation": "string"
  }
}"#;

/// Renders the analysis prompt. Pure: same input, same bytes.
pub fn build_analysis_prompt(input: &GrievanceInput) -> String {
    let location = match (input.city(), input.state()) {
        (None, None) => NOT_SPECIFIED.to_string(),
        (city, state) => format!(
            "{}, {}",
            city.unwrap_or(NOT_SPECIFIED),
            state.unwrap_or(NOT_SPECIFIED)
        ),
    };

    render(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("{category}", input.category()),
            ("{location}", location.as_str()),
            ("{department}", input.department().unwrap_or(NOT_SPECIFIED)),
            ("{description}", input.description()),
        ],
    )
}

/// Single-pass placeholder substitution. Inserted values are never scanned
/// again, so user text containing `{category}` etc. stays literal.
fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match vars.iter().find(|(key, _)| tail.starts_with(*key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::models::AnalyzeRequest;

    fn input(department: Option<&str>) -> GrievanceInput {
        GrievanceInput::from_request(AnalyzeRequest {
            category: Some("Consumer".to_string()),
            city: Some("Pune".to_string()),
            state: Some("Maharashtra".to_string()),
            department: department.map(str::to_string),
            description: Some("Mera refund 2 mahine se nahi mila".to_string()),
        })
        .unwrap()
    }

    #[test]
    fn test_prompt_contains_every_field_value() {
        let prompt = build_analysis_prompt(&input(Some("Flipkart")));
        assert!(prompt.contains("- Category: Consumer"));
        assert!(prompt.contains("- Location: Pune, Maharashtra"));
        assert!(prompt.contains("- Department/Entity: Flipkart"));
        assert!(prompt.contains("- Description: \"Mera refund 2 mahine se nahi mila\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let a = build_analysis_prompt(&input(None));
        let b = build_analysis_prompt(&input(None));
        assert_eq!(a, b);
    }

    #[test]
    fn test_missing_department_renders_placeholder() {
        let prompt = build_analysis_prompt(&input(None));
        assert!(prompt.contains("- Department/Entity: Not specified"));
    }

    #[test]
    fn test_missing_location_renders_placeholder() {
        let input = GrievanceInput::from_request(AnalyzeRequest {
            category: Some("Civic".to_string()),
            description: Some("Road is broken".to_string()),
            state: Some("Kerala".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(build_analysis_prompt(&input).contains("- Location: Not specified, Kerala\n"));

        let input = GrievanceInput::from_request(AnalyzeRequest {
            category: Some("Civic".to_string()),
            description: Some("Road is broken".to_string()),
            city: Some("Pune".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(build_analysis_prompt(&input).contains("- Location: Pune, Not specified\n"));

        let input = GrievanceInput::from_request(AnalyzeRequest {
            category: Some("Civic".to_string()),
            description: Some("Road is broken".to_string()),
            ..Default::default()
        })
        .unwrap();
        assert!(build_analysis_prompt(&input).contains("- Location: Not specified\n"));
    }

    #[test]
    fn test_prompt_contains_all_seven_steps_in_order() {
        let prompt = build_analysis_prompt(&input(None));
        let mut last = 0;
        for step in 1..=7 {
            let marker = format!("STEP {step}:");
            let pos = prompt.find(&marker).expect("step marker present");
            assert!(pos > last, "{marker} out of order");
            last = pos;
        }
    }

    #[test]
    fn test_prompt_sections_in_fixed_order() {
        let prompt = build_analysis_prompt(&input(None));
        let persona = prompt.find("You are VoiceMyIssue").unwrap();
        let fields = prompt.find("User Input:").unwrap();
        let language = prompt.find("LANGUAGE MATCHING").unwrap();
        let steps = prompt.find("STEP 1:").unwrap();
        let schema = prompt.find("Output strictly in this JSON format:").unwrap();
        assert!(persona < fields && fields < language && language < steps && steps < schema);
    }

    #[test]
    fn test_prompt_embeds_schema_template() {
        let prompt = build_analysis_prompt(&input(None));
        let schema_start = ANALYSIS_PROMPT_TEMPLATE
            .find("Output strictly in this JSON format:")
            .unwrap();
        assert!(prompt.ends_with(&ANALYSIS_PROMPT_TEMPLATE[schema_start..]));
        assert_eq!(prompt.matches(r#""level": "Low" | "Medium" | "High""#).count(), 2);
        for field in ["\"actionId\"", "\"simplifiedExplanation\"", "\"submissionGuide\""] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }

    #[test]
    fn test_field_values_with_placeholders_stay_literal() {
        let input = GrievanceInput::from_request(AnalyzeRequest {
            category: Some("{description}".to_string()),
            description: Some("literal {category} text".to_string()),
            ..Default::default()
        })
        .unwrap();
        let prompt = build_analysis_prompt(&input);
        assert!(prompt.contains("- Category: {description}"));
        assert!(prompt.contains("- Description: \"literal {category} text\""));
    }
}
