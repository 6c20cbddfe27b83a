//! Department-specific parsing rules and the category tag map.
//!
//! A handful of bulletin pages merge two sub-disciplines into one document.
//! Rather than branching on department names inside the parser, each such
//! page gets a configuration entry: the category sequence it walks through
//! and the trigger that advances it. The parser consumes these tables and
//! knows nothing about individual departments.

/// Trigger that switches a merged page from its first category to the next.
#[derive(Debug, Clone)]
pub enum CategoryTrigger {
    /// The leading course number drops more than `margin` below the previous
    /// course's, signalling a numbering restart for the second subject.
    NumericDrop { margin: u32 },
    /// A specific course number opens the second subject's sequence.
    AnchorNumber { anchor: &'static str },
    /// A language name inside the course title selects the category
    /// "<Language> Studies" directly (no fixed sequence).
    LanguageKeyword,
}

/// Rules for one department page.
#[derive(Debug, Clone)]
pub struct DepartmentRules {
    pub department: &'static str,
    /// Categories in page order; empty for `LanguageKeyword` departments.
    pub categories: &'static [&'static str],
    pub trigger: CategoryTrigger,
}

const SPLIT_DEPARTMENTS: &[DepartmentRules] = &[
    DepartmentRules {
        department: "Mathematics and Computer Science",
        categories: &["Mathematics", "Computer Science"],
        trigger: CategoryTrigger::NumericDrop { margin: 50 },
    },
    DepartmentRules {
        department: "Theatre and Dance",
        categories: &["Theatre", "Dance"],
        trigger: CategoryTrigger::AnchorNumber { anchor: "40" },
    },
    DepartmentRules {
        department: "Modern Languages and Literatures",
        categories: &[],
        trigger: CategoryTrigger::LanguageKeyword,
    },
];

/// Languages aggregated under Modern Languages and Literatures.
pub const LANGUAGES: &[&str] = &[
    "Arabic", "Chinese", "French", "German", "Italian", "Japanese", "Spanish",
];

/// Category names that, as section headers, override the current category
/// for every following course until the next matching header.
const SECTION_CATEGORIES: &[&str] = &[
    "Arabic Islamic and Middle Eastern Studies",
    "Asian Studies",
    "Catholic Studies",
    "Gender and Sexuality Studies",
    "Latin American Studies",
    "Premodern Studies",
    "Womens and Gender Studies",
];

/// Sidebar entries under a college that are not department pages.
pub const INDEX_SKIP: &[&str] = &[
    "Medical and Health Humanities",
    "Undergraduate Degrees",
    "Centers Institutes and Special Programs",
];

pub fn rules_for(department: &str) -> Option<&'static DepartmentRules> {
    let wanted = normalize(department);
    SPLIT_DEPARTMENTS
        .iter()
        .find(|rules| normalize(rules.department) == wanted)
}

pub fn section_category(header: &str) -> Option<&'static str> {
    let wanted = normalize(header);
    SECTION_CATEGORIES
        .iter()
        .find(|name| normalize(name) == wanted)
        .copied()
}

/// Resolved category -> registrar tag. Unmapped categories get "".
const TAG_MAP: &[(&str, &str)] = &[
    // CAS
    ("Anthropology", "ANTH"),
    ("Art and Art History", "ARTH"),
    ("Biology", "BIOL"),
    ("Chemistry and Biochemistry", "CHEM"),
    ("Child Studies", "CHST"),
    ("Classics", "CLAS"),
    ("Communication", "COMM"),
    ("Economics", "ECON"),
    ("English", "ENGL"),
    ("Environmental Studies and Sciences", "ENVS"),
    ("Ethnic Studies", "ETHN"),
    ("History", "HIST"),
    ("Mathematics", "MATH"),
    ("Computer Science", "CSCI"),
    ("Music", "MUSC"),
    ("Neuroscience", "NEUR"),
    ("Philosophy", "PHIL"),
    ("Physics", "PHYS"),
    ("Political Science", "POLI"),
    ("Psychology", "PSYC"),
    ("Public Health Department", "PHSC"),
    ("Religious Studies", "TESP"),
    ("Sociology", "SOCI"),
    ("Theatre", "THTR"),
    ("Dance", "DANC"),
    ("Womens and Gender Studies", "WGST"),
    ("Gender and Sexuality Studies", "WGST"),
    ("Asian Studies", "ASIA"),
    ("Catholic Studies", "ASCI"),
    // LSB
    ("Management", "MGMT"),
    ("Marketing", "MKTG"),
    ("Information Systems & Analytics", "OMIS"),
    ("Accounting", "ACTG"),
    ("Finance", "FNCE"),
    // SOE
    ("Applied Mathematics", "AMTH"),
    ("Bioengineering", "BIOE"),
    ("Civil, Environmental, and Sustainable Engineering", "CENG"),
    ("Computer Science and Engineering", "CSEN"),
    ("Electrical and Computer Engineering", "ECEN"),
    ("General Engineering", "ENGR"),
    ("Mechanical Engineering", "MECH"),
];

/// Looks up the registrar tag for a resolved category. Bulletin pages are
/// inconsistent about internal whitespace, so comparison collapses it.
pub fn tag_for(category: &str) -> &'static str {
    let wanted = normalize(category);
    TAG_MAP
        .iter()
        .find(|(name, _)| normalize(name) == wanted)
        .map(|(_, tag)| *tag)
        .unwrap_or("")
}

pub fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}
