// Fallback Matcher
//
// Keyword rule table used when no model can be reached. Always returns a
// runnable query.

use crate::models::Translation;

#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    /// All groups must match; a group matches if any of its keywords occurs
    pub keywords: &'static [&'static [&'static str]],
    pub query: &'static str,
    pub confidence: f64,
    pub interpretation: &'static str,
}

impl FallbackRule {
    fn matches(&self, question: &str) -> bool {
        self.keywords
            .iter()
            .all(|group| group.iter().any(|keyword| question.contains(keyword)))
    }
}

pub static RULES: &[FallbackRule] = &[
    FallbackRule {
        keywords: &[&["region"], &["climate"]],
        query: "SELECT r.region_name, c.temperature, c.rainfall, c.humidity \
                FROM postgres.public.`climate_data` c \
                JOIN postgres.public.`region_info` r ON c.region_id = r.region_id LIMIT 10",
        confidence: 0.7,
        interpretation: "Showing climate data by region",
    },
    FallbackRule {
        keywords: &[&["region"]],
        query: "SELECT * FROM postgres.public.`region_info` LIMIT 10",
        confidence: 0.8,
        interpretation: "Listing all regions",
    },
    FallbackRule {
        keywords: &[&["climate", "temperature"]],
        query: "SELECT * FROM postgres.public.`climate_data` LIMIT 10",
        confidence: 0.7,
        interpretation: "Showing climate data",
    },
    FallbackRule {
        keywords: &[&["species", "biodiversity"]],
        query: "SELECT * FROM mongo.environmental_db.`Biodiversity_Data` LIMIT 10",
        confidence: 0.7,
        interpretation: "Showing biodiversity data",
    },
    FallbackRule {
        keywords: &[&["sensor", "co2"]],
        query: "SELECT * FROM dfs.data.`sensor_readings.csv` LIMIT 10",
        confidence: 0.7,
        interpretation: "Showing sensor readings",
    },
];

pub static DEFAULT_RULE: FallbackRule = FallbackRule {
    keywords: &[],
    query: "SELECT * FROM postgres.public.`region_info` LIMIT 10",
    confidence: 0.4,
    interpretation: "Unable to parse query. Showing regions as default.",
};

/// First rule whose keywords all occur in the lower-cased question
pub fn find_rule(question: &str) -> &'static FallbackRule {
    let lower = question.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&lower))
        .unwrap_or(&DEFAULT_RULE)
}

pub fn match_question(question: &str) -> Translation {
    let rule = find_rule(question);
    Translation::RuleBased {
        query: rule.query.to_string(),
        confidence: rule.confidence,
        interpretation: rule.interpretation.to_string(),
    }
}
