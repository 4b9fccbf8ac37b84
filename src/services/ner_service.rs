use crate::error::{Error, Result};
use crate::models::entity::{Analysis, Entity, EntityLabel};
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Local linguistic analysis: sentence segmentation plus labelled entity spans.
///
/// Built once at start-up and shared read-only between requests.
#[cfg_attr(test, mockall::automock)]
pub trait EntityRecognizer: Send + Sync {
    fn analyze(&self, text: &str) -> Analysis;
}

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December|Sept|Jan|Feb|Mar|Apr|Jun|Jul|Aug|Sep|Oct|Nov|Dec";

const ORDINAL_WORDS: &str = "first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|eleventh|twelfth|thirteenth|fourteenth|fifteenth|sixteenth|seventeenth|eighteenth|nineteenth|twentieth|twenty-first";

const WEEKDAYS: &str = "Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday";

const PHRASE_TOKEN: &str = r"(?:(?:[A-Z]\.){2,}|[A-Z]\.|[a-z][A-Z][\w'’&-]*|[A-Z][\w'’&-]*)";

const CONNECTORS: &[&str] = &[
    "of", "the", "for", "de", "la", "le", "du", "von", "van", "der", "del", "da", "al", "bin",
];

/// Lowercase connectors that may appear inside personal names.
const NAME_PARTICLES: &[&str] = &["de", "la", "le", "du", "von", "van", "der", "del", "da", "al", "bin"];

const ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "St", "Jr", "Sr", "Gen", "Col", "Lt", "Capt", "Sgt", "Rev",
    "Hon", "Mt", "Ltd", "Co", "Corp", "vs", "etc", "e.g", "i.e", "U.S", "U.K", "U.N", "No",
    "Fig", "approx", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep", "Sept", "Oct", "Nov",
    "Dec",
];

const LEADING_STOPWORDS: &[&str] = &[
    "The", "A", "An", "In", "On", "At", "By", "For", "From", "With", "Without", "During", "After",
    "Before", "Since", "Until", "Through", "This", "That", "These", "Those", "It", "Its", "He",
    "She", "They", "We", "I", "His", "Her", "Their", "Our", "My", "Your", "When", "While",
    "Although", "Though", "However", "Meanwhile", "Today", "Yesterday", "Then", "There", "Here",
    "As", "If", "Of", "To", "And", "But", "Or", "So", "Yet", "Many", "Some", "Most", "All", "Each",
    "Every", "Both", "Several", "According", "Under", "Over", "Between", "Among", "Despite",
    "Because", "Also", "Later", "Early", "Once", "Following", "Unlike", "Like", "Where", "Why",
    "What", "Who", "Which", "How", "Not", "No", "Yes", "Only",
];

const HONORIFICS: &[&str] = &[
    "Mr", "Mr.", "Mrs", "Mrs.", "Ms", "Ms.", "Dr", "Dr.", "Prof", "Prof.", "President", "King",
    "Queen", "Prince", "Princess", "Sir", "Dame", "Lady", "Lord", "General", "Gen.", "Captain",
    "Capt.", "Pope", "Emperor", "Empress", "Chancellor", "Senator", "Governor", "Minister",
    "Judge", "Saint", "Professor", "Doctor",
];

const LAW_HEADS: &[&str] = &[
    "Act", "Acts", "Treaty", "Constitution", "Amendment", "Code", "Charter", "Accord", "Accords",
    "Convention", "Protocol", "Statute", "Law", "Bill", "Doctrine", "Agreement", "Declaration",
    "Decree", "Edict", "Regulation", "Directive",
];

const EVENT_HEADS: &[&str] = &[
    "War", "Wars", "Revolution", "Battle", "Olympics", "Games", "Summit", "Crisis", "Festival",
    "Cup", "Championship", "Championships", "Expo", "Massacre", "Election", "Depression",
    "Rebellion", "Uprising", "Siege", "Invasion", "Renaissance", "Reformation", "Holocaust",
    "Pandemic", "Conference", "Riots", "Strike", "Landing", "Crusade", "Crusades", "Plague",
];

const ORG_HEADS: &[&str] = &[
    "Inc", "Corp", "Corporation", "Company", "Co", "Ltd", "LLC", "Group", "University", "College",
    "Institute", "Association", "Party", "Bank", "Agency", "Council", "Committee",
    "Organization", "Organisation", "Foundation", "Society", "Union", "Ministry", "Department",
    "Court", "Congress", "Parliament", "Senate", "Army", "Navy", "League", "Nations", "Club",
    "Museum", "School", "Academy", "Commission", "Bureau", "Board", "Federation", "Alliance",
    "Assembly", "Church", "Airlines", "Motors", "Technologies", "Labs", "Laboratories", "Press",
    "Times", "Network", "Fund", "Office", "Service", "Police", "Institution", "Railway",
];

const BUILTIN_GPE: &[&str] = &[
    "Afghanistan", "Algeria", "Argentina", "Australia", "Austria", "Bangladesh", "Belgium",
    "Brazil", "Britain", "Great Britain", "Canada", "Chile", "China", "Colombia", "Cuba",
    "Czechoslovakia", "Denmark", "Egypt", "England", "Ethiopia", "Finland", "France", "Germany",
    "Greece", "Hungary", "India", "Indonesia", "Iran", "Iraq", "Ireland", "Israel", "Italy",
    "Japan", "Kenya", "Korea", "South Korea", "North Korea", "Mexico", "Morocco", "Netherlands",
    "New Zealand", "Nigeria", "Norway", "Pakistan", "Peru", "Poland", "Portugal", "Prussia",
    "Russia", "Saudi Arabia", "Scotland", "South Africa", "Spain", "Sweden", "Switzerland",
    "Syria", "Tajikistan", "Turkey", "Ukraine", "United Kingdom", "United States",
    "United States of America", "USA", "US", "U.S.", "UK", "U.K.", "Soviet Union", "USSR",
    "Vietnam", "Wales", "Amsterdam", "Athens", "Beijing", "Berlin", "Boston", "Brussels",
    "Cairo", "Chicago", "Delhi", "New Delhi", "Dublin", "Dushanbe", "Geneva", "Hong Kong",
    "Istanbul", "Jerusalem", "Kyiv", "Lisbon", "London", "Los Angeles", "Madrid", "Moscow",
    "Mumbai", "New York", "New York City", "Oslo", "Paris", "Prague", "Rome", "San Francisco",
    "Seoul", "Shanghai", "Stockholm", "Sydney", "Tokyo", "Toronto", "Versailles", "Vienna",
    "Warsaw", "Washington", "California", "Texas", "Florida", "Virginia", "Massachusetts",
    "Pennsylvania", "Georgia", "Ohio", "Michigan", "Illinois",
];

const BUILTIN_ORG: &[&str] = &[
    "NASA", "NATO", "UNESCO", "UNICEF", "FBI", "CIA", "Google", "Apple", "Microsoft", "Amazon",
    "Tesla", "IBM", "Intel", "Samsung", "Toyota", "Boeing", "Facebook", "Meta", "OpenAI",
    "European Union", "United Nations", "Red Cross", "World Bank", "Congress",
];

const BUILTIN_PRODUCT: &[&str] = &[
    "iPhone", "iPad", "iPod", "Android", "Windows", "Linux", "PlayStation", "Xbox", "Kindle",
    "ChatGPT", "Walkman", "Macintosh", "Model T", "Concorde", "Sputnik", "Apollo 11",
];

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    end: usize,
    label: EntityLabel,
}

fn overlaps(spans: &[Span], start: usize, end: usize) -> bool {
    spans.iter().any(|s| start < s.end && s.start < end)
}

/// Heuristic recognizer: regex patterns for dates and numbers, capitalized
/// phrase chunking, and a gazetteer plus keyword heads for classification.
pub struct RuleBasedRecognizer {
    money_re: Regex,
    percent_re: Regex,
    date_re: Regex,
    cardinal_re: Regex,
    title_re: Regex,
    phrase_re: Regex,
    gazetteer: HashMap<String, EntityLabel>,
}

impl RuleBasedRecognizer {
    pub fn new() -> Result<Self> {
        let ord = r"(?:st|nd|rd|th)?";
        let m = format!("(?:{})", MONTHS);
        let date = format!(
            r"\b(?:{m}\.?\s+\d{{1,2}}{ord},?\s+\d{{4}}|\d{{1,2}}{ord}\s+(?:of\s+)?{m},?\s+\d{{4}}|{m}\.?\s+(?:of\s+)?\d{{4}}|{m}\.?\s+\d{{1,2}}{ord}|\d{{1,2}}{ord}\s+(?:of\s+)?{m}|\d{{4}}-\d{{2}}-\d{{2}}|\d{{1,2}}/\d{{1,2}}/\d{{2,4}}|(?:the\s+)?(?:\d{{1,2}}(?:st|nd|rd|th)|{ORDINAL_WORDS})\s+century|(?:1\d|20)\d{{2}}s|(?:1\d|20)\d{{2}}|{WEEKDAYS})\b"
        );
        let phrase = format!(
            r"\b{t}(?:\s+(?:(?:{c})\s+)*{t})*",
            t = PHRASE_TOKEN,
            c = CONNECTORS.join("|")
        );

        let mut gazetteer = HashMap::new();
        for name in BUILTIN_GPE {
            gazetteer.insert(name.to_string(), EntityLabel::Gpe);
        }
        for name in BUILTIN_ORG {
            gazetteer.insert(name.to_string(), EntityLabel::Org);
        }
        for name in BUILTIN_PRODUCT {
            gazetteer.insert(name.to_string(), EntityLabel::Product);
        }

        Ok(Self {
            money_re: compile(r"[$€£]\s?\d[\d,]*(?:\.\d+)?(?:\s(?:million|billion|trillion)\b)?")?,
            percent_re: compile(r"\b\d+(?:\.\d+)?\s?(?:%|percent\b)")?,
            date_re: compile(&date)?,
            cardinal_re: compile(r"\b\d[\d,]*(?:\.\d+)?\b")?,
            title_re: compile(r#"["“]([A-Z][^"“”]{0,80}?)["”]"#)?,
            phrase_re: compile(&phrase)?,
            gazetteer,
        })
    }

    /// Extends the built-in gazetteer with a JSON file of the form
    /// `{"GPE": ["Wakanda"], "PERSON": ["Ada Lovelace"]}`.
    pub fn with_gazetteer_file(mut self, path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read gazetteer {}: {}", path, e)))?;
        let extra: HashMap<EntityLabel, Vec<String>> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("Invalid gazetteer {}: {}", path, e)))?;

        let mut added = 0;
        for (label, names) in extra {
            for name in names {
                let name = name.trim().to_string();
                if !name.is_empty() {
                    self.gazetteer.insert(name, label);
                    added += 1;
                }
            }
        }
        tracing::info!("Loaded {} gazetteer entries from {}", added, path);
        Ok(self)
    }

    fn scan_pattern(&self, re: &Regex, sentence: &str, label: EntityLabel, spans: &mut Vec<Span>) {
        for m in re.find_iter(sentence) {
            if !overlaps(spans, m.start(), m.end()) {
                spans.push(Span {
                    start: m.start(),
                    end: m.end(),
                    label,
                });
            }
        }
    }

    fn scan_titles(&self, sentence: &str, spans: &mut Vec<Span>) {
        for caps in self.title_re.captures_iter(sentence) {
            let Some(inner) = caps.get(1) else { continue };
            let title = inner.as_str();
            if title.split_whitespace().count() > 8 || title.ends_with([',', '.', '!', '?']) {
                continue;
            }
            if !overlaps(spans, inner.start(), inner.end()) {
                spans.push(Span {
                    start: inner.start(),
                    end: inner.end(),
                    label: EntityLabel::WorkOfArt,
                });
            }
        }
    }

    fn scan_phrases(&self, sentence: &str, spans: &mut Vec<Span>, person_names: &mut HashSet<String>) {
        for m in self.phrase_re.find_iter(sentence) {
            if overlaps(spans, m.start(), m.end()) {
                continue;
            }
            let phrase = m.as_str();
            let words = word_spans(phrase);

            let mut first = 0;
            let mut honorific = false;
            while first < words.len() {
                let word = &phrase[words[first].0..words[first].1];
                if HONORIFICS.contains(&word) {
                    honorific = true;
                } else if !(LEADING_STOPWORDS.contains(&word) || CONNECTORS.contains(&word)) {
                    break;
                }
                first += 1;
            }
            if first == words.len() {
                continue;
            }

            let start = words[first].0;
            let mut end = phrase.len();
            if phrase.ends_with("'s") || phrase.ends_with("’s") {
                end = phrase.trim_end_matches("'s").trim_end_matches("’s").len();
            }
            if end <= start {
                continue;
            }

            let text = &phrase[start..end];
            let sentence_initial = m.start() + start == 0;
            if let Some(label) = self.classify(text, sentence_initial, honorific, person_names) {
                spans.push(Span {
                    start: m.start() + start,
                    end: m.start() + end,
                    label,
                });
            }
        }
    }

    fn classify(
        &self,
        text: &str,
        sentence_initial: bool,
        honorific: bool,
        person_names: &mut HashSet<String>,
    ) -> Option<EntityLabel> {
        if let Some(label) = self.gazetteer.get(text) {
            return Some(*label);
        }

        let tokens: Vec<&str> = text.split_whitespace().collect();
        let has_head = |heads: &[&str]| {
            tokens
                .iter()
                .any(|t| heads.contains(&t.trim_end_matches('.')))
        };

        if has_head(LAW_HEADS) {
            return Some(EntityLabel::Law);
        }
        if has_head(EVENT_HEADS) {
            return Some(EntityLabel::Event);
        }
        if has_head(ORG_HEADS) {
            return Some(EntityLabel::Org);
        }

        if tokens.len() == 1 {
            let token = tokens[0];
            if is_acronym(token) {
                return Some(EntityLabel::Org);
            }
            if is_camel_case(token) {
                return Some(EntityLabel::Product);
            }
            if honorific || person_names.contains(token) {
                return Some(EntityLabel::Person);
            }
            if MONTHS.split('|').any(|mo| mo == token) || WEEKDAYS.split('|').any(|d| d == token) {
                return None;
            }
            return if sentence_initial { None } else { Some(EntityLabel::Misc) };
        }

        let looks_like_name = tokens
            .iter()
            .all(|t| NAME_PARTICLES.contains(t) || is_name_token(t));
        if honorific || looks_like_name {
            if let Some(last) = tokens.last() {
                person_names.insert(last.to_string());
            }
            return Some(EntityLabel::Person);
        }

        Some(EntityLabel::Misc)
    }
}

impl EntityRecognizer for RuleBasedRecognizer {
    fn analyze(&self, text: &str) -> Analysis {
        let sentences = split_sentences(text);
        let mut entities = Vec::new();
        let mut person_names = HashSet::new();

        for sentence in &sentences {
            let mut spans: Vec<Span> = Vec::new();
            self.scan_pattern(&self.money_re, sentence, EntityLabel::Money, &mut spans);
            self.scan_pattern(&self.percent_re, sentence, EntityLabel::Percent, &mut spans);
            self.scan_pattern(&self.date_re, sentence, EntityLabel::Date, &mut spans);
            self.scan_pattern(&self.cardinal_re, sentence, EntityLabel::Cardinal, &mut spans);
            self.scan_titles(sentence, &mut spans);
            self.scan_phrases(sentence, &mut spans, &mut person_names);

            spans.sort_by_key(|s| s.start);
            entities.extend(
                spans
                    .into_iter()
                    .map(|s| Entity::new(&sentence[s.start..s.end], s.label)),
            );
        }

        tracing::debug!(
            "Analyzed {} sentences, {} entities",
            sentences.len(),
            entities.len()
        );

        Analysis {
            sentences: sentences.into_iter().map(String::from).collect(),
            entities,
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Internal(format!("Invalid recognizer pattern: {}", e)))
}

fn word_spans(s: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in s.char_indices() {
        if c.is_whitespace() {
            if let Some(st) = start.take() {
                spans.push((st, i));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(st) = start {
        spans.push((st, s.len()));
    }
    spans
}

fn is_acronym(token: &str) -> bool {
    let letters = token.chars().filter(|c| c.is_ascii_alphabetic()).count();
    (2..=6).contains(&letters)
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '&' || c == '.')
}

fn is_camel_case(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next();
    let rest: Vec<char> = chars.collect();
    rest.windows(2)
        .any(|w| w[0].is_lowercase() && w[1].is_uppercase())
}

fn is_name_token(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_uppercase() => chars.all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '\'' | '’')),
        _ => false,
    }
}

/// Sentence segmentation on `.`, `!` and `?` followed by whitespace and a
/// plausible sentence start. Abbreviations and single-letter initials do not end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        let (idx, c) = chars[i];
        if !matches!(c, '.' | '!' | '?') {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?' | '"' | '\'' | '”' | '’' | ')' | ']') {
            j += 1;
        }
        let end = chars.get(j).map(|(pos, _)| *pos).unwrap_or(text.len());
        let at_boundary = j == chars.len() || (chars[j].1.is_whitespace() && next_starts_sentence(&chars, j));

        if at_boundary && !(c == '.' && ends_with_abbreviation(&text[start..idx])) {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence);
            }
            start = end;
        }
        i = j;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

fn next_starts_sentence(chars: &[(usize, char)], from: usize) -> bool {
    match chars[from..].iter().map(|(_, c)| *c).find(|c| !c.is_whitespace()) {
        Some(c) => c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '“' | '\'' | '‘' | '('),
        None => true,
    }
}

fn ends_with_abbreviation(before_dot: &str) -> bool {
    let word = before_dot
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or("")
        .trim_start_matches(['(', '"', '\'', '“']);
    let mut chars = word.chars();
    let single_initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase());
    single_initial || ABBREVIATIONS.contains(&word)
}
