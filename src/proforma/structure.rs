// src/proforma/structure.rs

use crate::models::{
    proforma::Section,
    question::{Question, QuestionType},
};

fn text(id: &str, text: &str, required: bool) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::ShortText,
        text: text.to_string(),
        required,
        options: vec![],
        scale: None,
    }
}

fn number(id: &str, text: &str) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::Number,
        text: text.to_string(),
        required: true,
        options: vec![],
        scale: None,
    }
}

fn radio(id: &str, text: &str, options: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        question_type: QuestionType::SingleChoice,
        text: text.to_string(),
        required: true,
        options: options.iter().map(|o| o.to_string()).collect(),
        scale: None,
    }
}

const YES_NO: &[&str] = &["Yes", "No"];
const YES_NO_UNSURE: &[&str] = &["Yes", "No", "Not sure"];

/// The fixed field proforma on childhood vaccination barriers.
pub fn sections() -> Vec<Section> {
    vec![
        Section {
            id: "demographic",
            title: "DEMOGRAPHIC INFORMATION",
            questions: vec![
                text("name", "Name of respondent", false),
                number("age", "Age"),
                radio("gender", "Gender", &["Male", "Female"]),
                radio(
                    "education_level",
                    "Education level",
                    &["No formal education", "Primary", "Secondary", "Higher"],
                ),
                text("occupation", "Occupation", true),
                radio(
                    "monthly_income",
                    "Monthly household income",
                    &["<15,000 PKR", "15,000-30,000 PKR", ">30,000 PKR"],
                ),
                number("children_under_2", "Total number of children under 2 years"),
                text("youngest_child_age", "Age of youngest child", true),
            ],
        },
        Section {
            id: "geographic",
            title: "GEOGRAPHIC AND ACCESS BARRIERS",
            questions: vec![
                radio(
                    "distance_to_center",
                    "Distance to nearest vaccination center",
                    &["<2 km", "2-5 km", ">5 km"],
                ),
                radio(
                    "transport_mode",
                    "Mode of transport to vaccination center",
                    &["Walk", "Motorbike", "Public transport", "Private car"],
                ),
                number("travel_cost", "Average cost of travel to vaccination center"),
                radio(
                    "services_regular",
                    "Are vaccination services available regularly in your area?",
                    YES_NO,
                ),
                radio(
                    "mobile_team_visit",
                    "Have you been visited by a mobile vaccination team?",
                    YES_NO,
                ),
                radio(
                    "seasonal_access",
                    "Are vaccination centers accessible during monsoon/winter seasons?",
                    YES_NO,
                ),
                radio(
                    "nomadic_difficulties",
                    "Do nomadic families in your area face difficulties accessing vaccination?",
                    YES_NO,
                ),
                radio(
                    "enough_centers_remote",
                    "Are there enough vaccination centers in remote areas of Awaran?",
                    YES_NO,
                ),
                radio(
                    "geo_challenges",
                    "Do geographical challenges prevent regular vaccination services?",
                    YES_NO,
                ),
                radio(
                    "transport_barrier",
                    "Is transportation a major barrier to vaccination in your area?",
                    YES_NO,
                ),
            ],
        },
        Section {
            id: "awareness",
            title: "AWARENESS AND INFORMATION SOURCES",
            questions: vec![
                radio(
                    "know_vaccine_purpose",
                    "Do you know the purpose of each vaccine given to children?",
                    YES_NO,
                ),
                radio(
                    "vaccine_info_source",
                    "Main source of vaccine information",
                    &["Lady Health Worker", "Health facility", "Media", "Religious leader", "Family"],
                ),
                radio(
                    "vaccine_safety_belief",
                    "Do you believe vaccines are safe for children?",
                    YES_NO_UNSURE,
                ),
                radio(
                    "language_barrier",
                    "Do you face language barriers when health workers explain vaccines?",
                    YES_NO,
                ),
                radio(
                    "heard_rumors",
                    "Have you heard rumors or misconceptions about vaccines?",
                    YES_NO,
                ),
                radio(
                    "awareness_campaigns",
                    "Are there awareness campaigns about vaccination in your area?",
                    YES_NO,
                ),
                radio(
                    "know_schedule",
                    "Do you know the complete vaccination schedule for children under 2 years?",
                    &["Yes", "No", "Partially"],
                ),
                radio(
                    "received_reminders",
                    "Have you ever received SMS or phone reminders for vaccination?",
                    YES_NO,
                ),
            ],
        },
        Section {
            id: "cultural",
            title: "CULTURAL AND RELIGIOUS FACTORS",
            questions: vec![
                radio(
                    "cultural_discouragement",
                    "Are there cultural beliefs in your community that discourage vaccination?",
                    YES_NO,
                ),
                radio(
                    "gender_differential_treatment",
                    "Do families in Awaran treat vaccination differently for boys and girls?",
                    YES_NO,
                ),
                radio(
                    "religious_leaders_opinion",
                    "What do religious leaders in your community say about vaccination?",
                    &["Support", "Oppose", "Neutral"],
                ),
                radio(
                    "male_permission_needed",
                    "Do women need male family member's permission for child vaccination?",
                    YES_NO,
                ),
                radio(
                    "traditional_healers_influence",
                    "Are there traditional healers who influence vaccination decisions?",
                    YES_NO,
                ),
                radio(
                    "tribal_customs_affect",
                    "Do tribal customs affect vaccination acceptance in your area?",
                    YES_NO,
                ),
                radio(
                    "vaccines_against_religion",
                    "Have you heard that vaccines are against religious beliefs?",
                    YES_NO,
                ),
                radio(
                    "older_family_members_support",
                    "Do older family members support or discourage vaccination?",
                    &["Support", "Discourage", "Neutral"],
                ),
            ],
        },
        Section {
            id: "health_system",
            title: "HEALTH SYSTEM AND SERVICE QUALITY",
            questions: vec![
                radio(
                    "rate_health_worker_behavior",
                    "How would you rate the behavior of health workers during vaccination?",
                    &["Good", "Fair", "Poor"],
                ),
                radio(
                    "service_hours_convenient",
                    "Are vaccination service hours convenient for your family?",
                    YES_NO,
                ),
                radio(
                    "refused_services",
                    "Have you ever been refused vaccination services?",
                    YES_NO,
                ),
                radio(
                    "trust_govt_vaccines",
                    "Do you trust vaccines provided at government health centers?",
                    YES_NO_UNSURE,
                ),
                radio(
                    "experienced_stock_outs",
                    "Have you experienced vaccine stock-outs at health facilities?",
                    YES_NO,
                ),
                radio(
                    "recommend_vaccination",
                    "Would you recommend vaccination to other parents in Awaran?",
                    YES_NO,
                ),
            ],
        },
    ]
}

pub const NOTES_PAGE_ID: &str = "notes";
pub const NOTE_LANGUAGE: &str = "language";
pub const NOTE_TEHSIL: &str = "tehsil";
pub const NOTE_OBSERVATIONS: &str = "observations";

/// Interviewer notes, asked on the last page.
pub fn note_questions() -> Vec<Question> {
    vec![
        text(NOTE_LANGUAGE, "Language of Interview", true),
        text(NOTE_TEHSIL, "Geographic Location (Tehsil)", true),
        Question {
            id: NOTE_OBSERVATIONS.to_string(),
            question_type: QuestionType::LongText,
            text: "Additional Observations (Optional)".to_string(),
            required: false,
            options: vec![],
            scale: None,
        },
    ]
}
