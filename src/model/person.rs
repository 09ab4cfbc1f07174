//! Persons: the unit of simulation, advanced one year at a time.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::id::{EmployerId, HouseholdId, PersonId, VehicleId};

/// Age at which a person counts as an adult for household composition,
/// inheritance, and welfare rules.
pub const ADULT_AGE: u32 = 18;

/// Number of five-year age brackets (`0-4` through `80-84`, then `85+`).
pub const NUM_AGE_BRACKETS: usize = 18;

/// Five-year bracket index for an age; ages 85 and over share the last bracket.
pub fn age_bracket(age: u32) -> usize {
    ((age / 5) as usize).min(NUM_AGE_BRACKETS - 1)
}

/// Number of travel-survey age groups used for commute purpose sampling.
pub const NUM_COMMUTE_BRACKETS: usize = 6;

/// Travel-survey age group index: 0-4, 5-17, 18-24, 25-54, 55-64, 65+.
pub fn commute_bracket(age: u32) -> usize {
    match age {
        0..=4 => 0,
        5..=17 => 1,
        18..=24 => 2,
        25..=54 => 3,
        55..=64 => 4,
        _ => 5,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Sex {
    Male,
    Female,
}

string_enum!(Sex {
    Male => "male",
    Female => "female",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum MaritalStatus {
    NeverMarried,
    Married,
    Widowed,
    Divorced,
    Separated,
}

string_enum!(MaritalStatus {
    NeverMarried => "never_married",
    Married => "married",
    Widowed => "widowed",
    Divorced => "divorced",
    Separated => "separated",
});

/// Education ladder. Dropout and completed states are absorbing except where
/// the transition rules admit re-entry (high school completion feeds
/// university entry, and so on up the ladder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EducationStage {
    TooYoung,
    Nursery,
    Elementary,
    Middle,
    HighSchool,
    HighSchoolCompleted,
    HighSchoolDropout,
    University,
    UniversityCompleted,
    UniversityDropout,
    Masters,
    MastersCompleted,
    MastersDropout,
    Phd,
    PhdCompleted,
}

string_enum!(EducationStage {
    TooYoung => "too_young",
    Nursery => "nursery",
    Elementary => "elementary",
    Middle => "middle",
    HighSchool => "high_school",
    HighSchoolCompleted => "high_school_completed",
    HighSchoolDropout => "high_school_dropout",
    University => "university",
    UniversityCompleted => "university_completed",
    UniversityDropout => "university_dropout",
    Masters => "masters",
    MastersCompleted => "masters_completed",
    MastersDropout => "masters_dropout",
    Phd => "phd",
    PhdCompleted => "phd_completed",
});

impl EducationStage {
    /// Stages that occupy a school seat while enrolled.
    pub fn is_enrolled(&self) -> bool {
        matches!(
            self,
            EducationStage::Nursery
                | EducationStage::Elementary
                | EducationStage::Middle
                | EducationStage::HighSchool
                | EducationStage::University
                | EducationStage::Masters
                | EducationStage::Phd
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EmploymentStatus {
    TooYoung,
    NotInLaborForce,
    Unemployed,
    Employed,
    Retired,
}

string_enum!(EmploymentStatus {
    TooYoung => "too_young",
    NotInLaborForce => "not_in_labor_force",
    Unemployed => "unemployed",
    Employed => "employed",
    Retired => "retired",
});

/// Skill tier used to pick an income band within an employer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum SkillLevel {
    EntryLevel,
    Skilled,
    MidProfessional,
    SeniorProfessional,
}

string_enum!(SkillLevel {
    EntryLevel => "entry_level",
    Skilled => "skilled",
    MidProfessional => "mid_professional",
    SeniorProfessional => "senior_professional",
});

impl SkillLevel {
    /// Tier implied by the highest education credential currently held.
    /// A dropout from a program ranks below its completers; a masters
    /// dropout falls back to the entry tier.
    pub fn for_education(stage: EducationStage) -> SkillLevel {
        match stage {
            EducationStage::MastersCompleted | EducationStage::PhdCompleted => {
                SkillLevel::SeniorProfessional
            }
            EducationStage::UniversityCompleted => SkillLevel::MidProfessional,
            EducationStage::HighSchoolCompleted | EducationStage::UniversityDropout => {
                SkillLevel::Skilled
            }
            _ => SkillLevel::EntryLevel,
        }
    }

    /// Index into an employer's income band array.
    pub fn index(&self) -> usize {
        match self {
            SkillLevel::EntryLevel => 0,
            SkillLevel::Skilled => 1,
            SkillLevel::MidProfessional => 2,
            SkillLevel::SeniorProfessional => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CommutePurpose {
    Work,
    School,
    Shopping,
    Leisure,
    Healthcare,
    Escort,
    Other,
}

string_enum!(CommutePurpose {
    Work => "work",
    School => "school",
    Shopping => "shopping",
    Leisure => "leisure",
    Healthcare => "healthcare",
    Escort => "escort",
    Other => "other",
});

impl CommutePurpose {
    /// All purposes, in the order commute weight rows are laid out.
    pub const ALL: [CommutePurpose; 7] = [
        CommutePurpose::Work,
        CommutePurpose::School,
        CommutePurpose::Shopping,
        CommutePurpose::Leisure,
        CommutePurpose::Healthcare,
        CommutePurpose::Escort,
        CommutePurpose::Other,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub age: u32,
}

/// School entry ages for one person. Nursery entry is drawn once at creation;
/// every later stage start is a fixed offset from it, so the whole ladder is
/// derived from the single drawn value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolStart {
    pub nursery: u32,
}

impl SchoolStart {
    /// Draw a nursery entry age of 2 or 3.
    pub fn draw(rng: &mut dyn RngCore) -> Self {
        let nursery = if rng.random_bool(0.5) { 2 } else { 3 };
        SchoolStart { nursery }
    }

    pub fn elementary(&self) -> u32 {
        self.nursery + 2
    }

    pub fn middle(&self) -> u32 {
        self.elementary() + 5
    }

    pub fn high_school(&self) -> u32 {
        self.middle() + 3
    }

    pub fn university(&self) -> u32 {
        self.high_school() + 4
    }

    pub fn masters(&self) -> u32 {
        self.university() + 4
    }

    pub fn phd(&self) -> u32 {
        self.masters() + 2
    }

    /// Entry age for the stages persons can be seeded into mid-course.
    fn seeded_start(&self, stage: EducationStage) -> Option<u32> {
        match stage {
            EducationStage::Nursery => Some(self.nursery),
            EducationStage::Elementary => Some(self.elementary()),
            EducationStage::Middle => Some(self.middle()),
            EducationStage::HighSchool => Some(self.high_school()),
            EducationStage::University => Some(self.university()),
            _ => None,
        }
    }
}

/// Start-of-run description of one person, supplied by the population
/// collaborator. Birth and immigration reuse the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonSeed {
    pub age: u32,
    pub sex: Sex,
    pub education: EducationStage,
    pub marital_status: MaritalStatus,
    pub employment: EmploymentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub age: u32,
    pub sex: Sex,
    pub education: EducationStage,
    /// Years spent in the current education stage, incremented before the
    /// stage transition checks run.
    pub year_in_level: u32,
    pub school_start: SchoolStart,
    /// Holds a school seat this tick. Reset by the seat reallocation pass.
    pub in_school: bool,
    pub employment: EmploymentStatus,
    pub employer: Option<EmployerId>,
    pub skill: Option<SkillLevel>,
    pub annual_income: f64,
    pub marital_status: MaritalStatus,
    /// Some once married, then counts years since the wedding.
    pub years_married: Option<u32>,
    pub household: HouseholdId,
    pub vehicles: Vec<Vehicle>,
    pub commute_purpose: CommutePurpose,
    pub use_bus: bool,
    pub accident_involvement: bool,
    pub laid_off_before: bool,
    /// Cumulative government support paid to this person.
    pub support_received: f64,
}

impl Person {
    /// Build a person from a seed tuple, assigned to `household`.
    ///
    /// Persons seeded part-way through an enrolled stage get a year-in-level
    /// estimate from their drawn entry age, floored at one.
    pub fn from_seed(
        id: PersonId,
        seed: &PersonSeed,
        household: HouseholdId,
        rng: &mut dyn RngCore,
    ) -> Self {
        let school_start = SchoolStart::draw(rng);
        let year_in_level = match school_start.seeded_start(seed.education) {
            Some(start) => (seed.age as i64 - start as i64 + 1).max(1) as u32,
            None => 0,
        };
        Person {
            id,
            age: seed.age,
            sex: seed.sex,
            education: seed.education,
            year_in_level,
            school_start,
            in_school: false,
            employment: seed.employment,
            employer: None,
            skill: None,
            annual_income: 0.0,
            marital_status: seed.marital_status,
            years_married: None,
            household,
            vehicles: Vec::new(),
            commute_purpose: CommutePurpose::Other,
            use_bus: false,
            accident_involvement: false,
            laid_off_before: false,
            support_received: 0.0,
        }
    }

    /// Seed tuple for a child born during the run.
    pub fn newborn_seed(sex: Sex) -> PersonSeed {
        PersonSeed {
            age: 0,
            sex,
            education: EducationStage::TooYoung,
            marital_status: MaritalStatus::NeverMarried,
            employment: EmploymentStatus::TooYoung,
        }
    }

    pub fn is_adult(&self) -> bool {
        self.age >= ADULT_AGE
    }

    pub fn owns_vehicle(&self) -> bool {
        !self.vehicles.is_empty()
    }

    /// Counted in the labor force for the employment rate.
    pub fn in_labor_force(&self) -> bool {
        !matches!(
            self.employment,
            EmploymentStatus::TooYoung | EmploymentStatus::Retired
        )
    }

    /// Assign the skill tier implied by current education and draw an annual
    /// income uniformly from the employer's band for that tier.
    pub fn assign_employment_income(
        &mut self,
        bands: &[(f64, f64); 4],
        income_modifier: f64,
        rng: &mut dyn RngCore,
    ) {
        let skill = SkillLevel::for_education(self.education);
        let (lo, hi) = bands[skill.index()];
        self.skill = Some(skill);
        self.annual_income = rng.random_range(lo..hi) * income_modifier;
    }

    /// Drop skill and income, e.g. after a layoff.
    pub fn clear_employment_income(&mut self) {
        self.skill = None;
        self.annual_income = 0.0;
    }
}
