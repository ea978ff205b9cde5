//! The built-in daily health questionnaire.

use crate::schema::{
    CheckboxCategory, CheckboxGroupField, CheckboxOption, ChoiceOption, EncodedKey,
    FieldDescriptor, FieldKind, FieldSchema, RadioField, SchemaError, SelectField, SliderField,
    TextField,
};

pub fn health_schema() -> Result<FieldSchema, SchemaError> {
    let fields = vec![
        slider("mood", "Overall mood today?", 5, ("0 - Very negative", "10 - Very positive")),
        slider("pain", "Pain Level (0-10)", 0, ("0 - No pain", "10 - Worst imaginable")),
        slider("anxiety", "Anxiety level today?", 0, ("0 - None", "10 - Extreme")),
        slider("energy", "Energy level today?", 5, ("0 - Exhausted", "10 - Very energetic")),
        FieldDescriptor::new(
            "allergy_state",
            "Allergic Symptoms",
            FieldKind::Radio(RadioField {
                options: options(&[
                    ("none", "None."),
                    ("other", "Yes. At body parts other than face."),
                    ("face", "Yes. On the face."),
                ]),
                encoding: Some(vec![
                    EncodedKey { key: "none".into(), value: 0 },
                    EncodedKey { key: "other".into(), value: 1 },
                    EncodedKey { key: "face".into(), value: 2 },
                ]),
                default: Some(0),
            }),
        )
        .required(),
        FieldDescriptor::new(
            "allergy_medication",
            "Anti-Allergic Drug Taken",
            FieldKind::Select(SelectField {
                options: options(&[
                    ("0", "0 - None"),
                    ("1", "1 - Half pill"),
                    ("2", "2 - One pill"),
                    ("3", "3 - 1.5 pills"),
                    ("4", "4 - Two pills"),
                ]),
                default: Some(0),
            }),
        )
        .required(),
        FieldDescriptor::new(
            "had_sex",
            "Had Sex in the Last 24 Hours",
            FieldKind::Radio(RadioField {
                options: options(&[("0", "No"), ("1", "Yes, with self"), ("2", "Yes, with partner")]),
                encoding: None,
                default: Some(0),
            }),
        )
        .required(),
        slider("sleep_quality", "Sleep Quality (0-10)", 5, ("0 - Very poor", "10 - Excellent")),
        slider("stress_level_work", "Work Stress Level (0-10)", 0, ("0 - No stress", "10 - Extreme stress")),
        slider("stress_level_home", "Home Stress Level (0-10)", 0, ("0 - No stress", "10 - Extreme stress")),
        slider("social_support", "Quality of social interactions?", 5, ("0 - Very poor", "10 - Excellent")),
        FieldDescriptor::new(
            "physical_activity",
            "Physical activity level?",
            FieldKind::Select(SelectField {
                options: options(&[
                    ("0", "Almost None (e.g., Home office + minimal movement)"),
                    ("1", "Light (e.g., cycle to work)"),
                    ("2", "Moderate (e.g., work out, sports club)"),
                    ("3", "Vigorous (e.g., very long run, competitive sports)"),
                ]),
                default: Some(0),
            }),
        )
        .required(),
        slider("weather_enjoyment", "How much did you enjoy today's weather?", 5, ("0 - Hated it", "10 - Loved it")),
        FieldDescriptor::new(
            "daily_activities",
            "Today's Activities & Factors",
            FieldKind::CheckboxGroup(CheckboxGroupField {
                categories: vec![
                    category("general", &[
                        ("positive_events", "Positive Events", "Exceptional Positive Events"),
                        ("negative_events", "Negative Events", "Exceptional Negative Events"),
                        ("work", "Work Day", "Did work today (as opposed to day off or weekend)"),
                        ("chores", "Many Chores", "Exceptional or many Chores/Errands"),
                        ("sick", "Sick", "Was sick (cold, flu, etc.)"),
                        ("other_medication", "Other Medication", "Took other medication (not allergy, e.g., painkillers, antibiotics)"),
                    ]),
                    category("activities", &[
                        ("gaming", "Gaming", "Gaming on Computer/Console/Phone"),
                        ("computer_creative_work", "Creative PC Work", "Computer Creative Work"),
                        ("creative", "Creative Other", "Other Creative Activity (e.g., Drawing/Music)"),
                        ("reading", "Reading", "Reading for Leisure (e.g., Book, Magazine)"),
                        ("outdoor", "Outdoor", "Outdoor Activities (e.g., Biking/Hiking/Walking)"),
                        ("exercise", "Exercise", "Exercise/Sports"),
                        ("tv_movies", "TV/Movies", "TV/Movies/Youtube"),
                        ("smartphone", "Smartphone", "Longer Smartphone Use (e.g., Browsing, Apps)"),
                        ("social_media", "Social Media", "Social Media"),
                        ("learning", "Learning", "Learning (e.g., Language, Course)"),
                    ]),
                    category("social", &[
                        ("family_time", "Family Time", "Quality Family Time"),
                        ("relationship_time", "Partner Time", "Quality Time with Partner"),
                        ("phone_call", "Call Friends", "Phone/Video Call with Friends or Family"),
                        ("neighbors", "Neighbors", "Interaction with Neighbors or Acquaintances, parents of child's friends"),
                        ("friends", "Friends", "Met Friend in Person, active visiting or inviting"),
                        ("social_outing", "Social Outing", "Social Outing (Bar, Party, Concert, Event)"),
                    ]),
                    category("eating & drinking", &[
                        ("ate_too_much", "Ate Too Much", "Ate Too Much"),
                        ("ate_too_little", "Ate Too Little", "Ate Too Little or Skipped Meal"),
                        ("eating_out", "Ate Out", "Ate Out (Restaurant, Party)"),
                        ("great_food", "Great Food", "Ate Food I Liked a Lot"),
                        ("alcohol", "Alcohol", "Consumed Alcoholic Beverages"),
                        ("other_drugs", "Other Drugs", "Consumed Other Drugs"),
                    ]),
                ],
            }),
        ),
        FieldDescriptor::new(
            "daily_comments",
            "Additional notes or comments (optional)",
            FieldKind::Text(TextField {
                placeholder: Some(
                    "Anything unusual today? Specific pain locations? Mood triggers? Things that helped?"
                        .into(),
                ),
                default: None,
            }),
        ),
    ];

    FieldSchema::new(fields)
}

fn slider(name: &str, label: &str, default: i64, scale: (&str, &str)) -> FieldDescriptor {
    FieldDescriptor::new(
        name,
        label,
        FieldKind::Slider(SliderField {
            min: 0,
            max: 10,
            default: Some(default),
            scale_labels: Some((scale.0.into(), scale.1.into())),
        }),
    )
    .required()
}

fn options(pairs: &[(&str, &str)]) -> Vec<ChoiceOption> {
    pairs
        .iter()
        .map(|(key, label)| ChoiceOption {
            key: (*key).into(),
            label: (*label).into(),
        })
        .collect()
}

fn category(name: &str, entries: &[(&str, &str, &str)]) -> CheckboxCategory {
    CheckboxCategory {
        name: name.into(),
        options: entries
            .iter()
            .map(|(key, short, long)| CheckboxOption {
                key: (*key).into(),
                short: (*short).into(),
                long: (*long).into(),
            })
            .collect(),
    }
}
