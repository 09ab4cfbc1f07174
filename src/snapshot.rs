//! Read-only views of a finished tick and the JSONL checkpoint writer.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::id::{HouseholdId, PersonId, VehicleId};
use crate::model::{
    Caps, CommutePurpose, EducationStage, EmploymentStatus, Household, HouseholdKind,
    MaritalStatus, MarriageRecord, Modifiers, Person, Sex, SimState, TickMetrics,
};

/// Everything an observer may inspect about the tick that just ran,
/// borrowed straight from the state. `new_marriages` covers only this
/// year's weddings.
pub struct TickSnapshot<'a> {
    pub year: u32,
    pub population: &'a BTreeMap<PersonId, Person>,
    pub households: &'a BTreeMap<HouseholdId, Household>,
    pub metrics: &'a TickMetrics,
    pub new_marriages: &'a [MarriageRecord],
    pub modifiers: &'a Modifiers,
    pub caps: &'a Caps,
}

impl<'a> TickSnapshot<'a> {
    pub fn capture(state: &'a SimState) -> Self {
        let mark = state.metrics.marriage_mark.min(state.marriages.len());
        TickSnapshot {
            year: state.year,
            population: &state.population,
            households: &state.households,
            metrics: &state.metrics,
            new_marriages: &state.marriages[mark..],
            modifiers: &state.modifiers,
            caps: &state.caps,
        }
    }
}

/// One person, one year, flattened for the output log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRow {
    pub year: u32,
    pub id: PersonId,
    pub age: u32,
    pub sex: Sex,
    pub education: EducationStage,
    pub employment: EmploymentStatus,
    pub marital_status: MaritalStatus,
    pub years_married: Option<u32>,
    pub household: HouseholdId,
    pub vehicles: Vec<VehicleId>,
    pub use_bus: bool,
    pub accident_involvement: bool,
    pub commute_purpose: CommutePurpose,
    pub annual_income: f64,
    pub support_received: f64,
}

pub fn person_row(year: u32, person: &Person) -> PersonRow {
    PersonRow {
        year,
        id: person.id,
        age: person.age,
        sex: person.sex,
        education: person.education,
        employment: person.employment,
        marital_status: person.marital_status,
        years_married: person.years_married,
        household: person.household,
        vehicles: person.vehicles.iter().map(|v| v.id).collect(),
        use_bus: person.use_bus,
        accident_involvement: person.accident_involvement,
        commute_purpose: person.commute_purpose,
        annual_income: person.annual_income,
        support_received: person.support_received,
    }
}

/// One occupied household, one year, with member-derived columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdRow {
    pub year: u32,
    pub id: HouseholdId,
    pub kind: HouseholdKind,
    pub members: u32,
    pub births: u32,
    pub deaths: u32,
    pub marriages: u32,
    pub students: u32,
    pub employed: u32,
    pub vehicles: u32,
    pub any_bus_rider: bool,
    pub income: f64,
    pub required_cost: f64,
    pub savings: f64,
    pub loans: f64,
    pub loan_repaid_total: f64,
    pub support_received: f64,
    pub taxes_total: f64,
}

fn household_row(state: &SimState, household: &Household) -> HouseholdRow {
    let members: Vec<&Person> = household
        .members
        .iter()
        .filter_map(|id| state.population.get(id))
        .collect();
    HouseholdRow {
        year: state.year,
        id: household.id,
        kind: household.kind,
        members: members.len() as u32,
        births: household.births,
        deaths: household.deaths,
        marriages: household.marriages,
        students: members.iter().filter(|p| p.education.is_enrolled()).count() as u32,
        employed: members
            .iter()
            .filter(|p| p.employment == EmploymentStatus::Employed)
            .count() as u32,
        vehicles: members.iter().map(|p| p.vehicles.len() as u32).sum(),
        any_bus_rider: members.iter().any(|p| p.use_bus),
        income: household.ledger.income,
        required_cost: household.ledger.required_cost,
        savings: household.ledger.savings,
        loans: household.ledger.loans,
        loan_repaid_total: household.ledger.loan_repaid_total,
        support_received: members.iter().map(|p| p.support_received).sum(),
        taxes_total: household.ledger.taxes_total,
    }
}

/// One row of the year-over-year city dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRow {
    pub year: u32,
    pub population: u32,
    pub households: u32,
    pub growth_rate: f64,
    pub births: u32,
    pub birth_rate: f64,
    pub deaths: u32,
    pub death_rate: f64,
    pub employment_rate: f64,
    pub avg_income: f64,
    pub avg_required_cost: f64,
    pub avg_savings: f64,
    pub avg_loans: f64,
    pub total_vehicles: u32,
    pub accidents: u32,
    pub cost_inflation_rate: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

/// Summarize the tick that just ran. Rates are against last year's
/// population so a growing city does not flatter its own birth rate.
pub fn summary_row(state: &SimState, prev_population: usize) -> SummaryRow {
    let population = state.population.len();
    let growth_rate = if prev_population > 0 {
        (population as f64 - prev_population as f64) / prev_population as f64
    } else {
        0.0
    };
    let births: u32 = state.households.values().map(|h| h.births).sum();
    let deaths: u32 = state.households.values().map(|h| h.deaths).sum();
    let per_capita = |count: u32| {
        if prev_population > 0 {
            f64::from(count) / prev_population as f64
        } else {
            0.0
        }
    };

    let employed = state
        .population
        .values()
        .filter(|p| p.employment == EmploymentStatus::Employed)
        .count();
    let labor_force = state.population.values().filter(|p| p.in_labor_force()).count();
    let employment_rate = if labor_force > 0 {
        employed as f64 / labor_force as f64
    } else {
        0.0
    };

    SummaryRow {
        year: state.year,
        population: population as u32,
        households: state.households.len() as u32,
        growth_rate,
        births,
        birth_rate: per_capita(births),
        deaths,
        death_rate: per_capita(deaths),
        employment_rate,
        avg_income: mean(
            state
                .population
                .values()
                .filter(|p| p.annual_income > 0.0)
                .map(|p| p.annual_income),
        ),
        avg_required_cost: mean(state.households.values().map(|h| h.ledger.required_cost)),
        avg_savings: mean(state.households.values().map(|h| h.ledger.savings)),
        avg_loans: mean(state.households.values().map(|h| h.ledger.loans)),
        total_vehicles: state
            .population
            .values()
            .map(|p| p.vehicles.len() as u32)
            .sum(),
        accidents: state.metrics.traffic.accidents,
        cost_inflation_rate: state.modifiers.cpi_multiplier() - 1.0,
    }
}

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Flush the current state to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 4 files:
/// - `persons.jsonl` — every living person
/// - `households.jsonl` — every occupied household with derived columns
/// - `marriages.jsonl` — every wedding since the run began
/// - `summary.jsonl` — one dashboard row per completed year
pub fn write_checkpoint(state: &SimState, summaries: &[SummaryRow], dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)?;

    write_jsonl(
        &dir.join("persons.jsonl"),
        state.population.values().map(|p| person_row(state.year, p)),
    )?;
    write_jsonl(
        &dir.join("households.jsonl"),
        state
            .households
            .values()
            .filter(|h| !h.is_empty())
            .map(|h| household_row(state, h)),
    )?;
    write_jsonl(&dir.join("marriages.jsonl"), state.marriages.iter())?;
    write_jsonl(&dir.join("summary.jsonl"), summaries.iter())?;

    Ok(())
}
