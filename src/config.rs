//! Input tables: demographic rates, employers, school capacities, the cost
//! of living grid, civic parameters, and the historical series the
//! forecasters are fitted on.
//!
//! [`Tables::default`] carries the calibration for a mid-size city of about
//! 73k people. Alternate calibrations load from JSON and are validated
//! before the first tick; a malformed table is a startup error, never a
//! mid-run one.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::id::EmployerId;
use crate::model::person::{EducationStage, NUM_AGE_BRACKETS, NUM_COMMUTE_BRACKETS};

/// Per-bracket annual rates. All tables are indexed by the five-year age
/// bracket of `person::age_bracket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicTables {
    pub death_male: [f64; NUM_AGE_BRACKETS],
    pub death_female: [f64; NUM_AGE_BRACKETS],
    pub fertility_married: [f64; NUM_AGE_BRACKETS],
    pub fertility_unmarried: [f64; NUM_AGE_BRACKETS],
    /// Probability that an unemployed seeker finds a position this year.
    pub job_finding: [f64; NUM_AGE_BRACKETS],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployerSpec {
    pub id: EmployerId,
    pub name: String,
    pub capacity: u32,
    /// Relative weight when pre-assigning the seeded workforce.
    pub seed_weight: f64,
    /// Annual income range per skill tier, entry level first.
    pub income_bands: [(f64, f64); 4],
}

/// Household composition bucket of the cost of living grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostBucket {
    SingleAdult,
    TwoAdultsOneWorking,
    TwoAdultsTwoWorking,
}

/// One spending category's annual cost by bucket and child count (columns
/// 0 through 3-or-more children).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCategory {
    pub name: String,
    pub single_adult: [f64; 4],
    pub two_adults_one_working: [f64; 4],
    pub two_adults_two_working: [f64; 4],
}

impl CostCategory {
    fn column(&self, bucket: CostBucket) -> &[f64; 4] {
        match bucket {
            CostBucket::SingleAdult => &self.single_adult,
            CostBucket::TwoAdultsOneWorking => &self.two_adults_one_working,
            CostBucket::TwoAdultsTwoWorking => &self.two_adults_two_working,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostGrid {
    pub categories: Vec<CostCategory>,
}

impl CostGrid {
    /// Total annual cost across all categories for a bucket at a child-count
    /// column. `child_idx` saturates at the last column.
    pub fn total(&self, bucket: CostBucket, child_idx: usize) -> f64 {
        let idx = child_idx.min(3);
        self.categories
            .iter()
            .map(|cat| cat.column(bucket)[idx])
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitTables {
    pub initial_buses: u32,
    pub initial_population: u32,
    pub bus_capacity: u32,
    pub trips_per_bus_per_day: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GovernmentTables {
    pub single_parent_support: f64,
    pub food_stamp_per_child: f64,
    /// Households earning under cost times this factor qualify as low income.
    pub low_income_threshold_factor: f64,
    pub annual_support_cap: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankTables {
    pub savings_annual_cap: f64,
    pub loans_annual_cap: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationTables {
    /// Arrivals per resident per year before the economic-index multiplier.
    pub base_annual_rate: f64,
    pub min_age: u32,
    pub max_age: u32,
    /// Education credential mix of arrivals, weighted.
    pub education_mix: Vec<(EducationStage, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarriageTables {
    pub base_rate: f64,
    pub groom_min_age: u32,
    pub max_age_gap: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleTables {
    /// Household income floor below which nobody buys a car.
    pub purchase_income_threshold: f64,
    pub purchase_prob_unemployed: f64,
    pub purchase_prob_employed: f64,
    /// Vehicles older than this are scrapped.
    pub retirement_age: u32,
}

/// Commute purpose weights per travel-survey age group, row order matching
/// `person::commute_bracket`, column order matching `CommutePurpose::ALL`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommuteTables {
    pub weights: [[f64; 7]; NUM_COMMUTE_BRACKETS],
}

/// Observed annual city-level series, one value per year from `first_year`.
/// All six series must cover the same years.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTables {
    pub first_year: u32,
    /// Deaths per 1000 residents.
    pub mortality: Vec<f64>,
    /// Births per 1000 residents.
    pub birth: Vec<f64>,
    /// Employed share of the labor force, percent.
    pub employment: Vec<f64>,
    /// Top marginal tax rate, percent.
    pub tax: Vec<f64>,
    /// Salary growth, percent.
    pub salary: Vec<f64>,
    /// Consumer price inflation, percent.
    pub cpi: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tables {
    pub demographics: DemographicTables,
    pub employers: Vec<EmployerSpec>,
    pub education_seats: BTreeMap<EducationStage, u32>,
    pub cost_grid: CostGrid,
    pub transit: TransitTables,
    pub government: GovernmentTables,
    pub bank: BankTables,
    pub immigration: ImmigrationTables,
    pub marriage: MarriageTables,
    pub vehicles: VehicleTables,
    pub commute: CommuteTables,
    pub history: HistoryTables,
}

impl Tables {
    /// Load tables from a JSON file and validate them.
    pub fn from_file(path: &Path) -> SimResult<Tables> {
        let file = File::open(path)?;
        let tables: Tables = serde_json::from_reader(BufReader::new(file))?;
        tables.validate()?;
        Ok(tables)
    }

    pub fn employer(&self, id: EmployerId) -> Option<&EmployerSpec> {
        self.employers.iter().find(|e| e.id == id)
    }

    /// Reject tables that would make a tick unrunnable. Runs once before the
    /// first tick so table errors never surface mid-run.
    pub fn validate(&self) -> SimResult<()> {
        fn check_rates(name: &str, rates: &[f64; NUM_AGE_BRACKETS]) -> SimResult<()> {
            for (i, &rate) in rates.iter().enumerate() {
                if !(0.0..=1.0).contains(&rate) {
                    return Err(SimError::Config(format!(
                        "{name} bracket {i} is {rate}, expected a probability"
                    )));
                }
            }
            Ok(())
        }

        check_rates("death_male", &self.demographics.death_male)?;
        check_rates("death_female", &self.demographics.death_female)?;
        check_rates("fertility_married", &self.demographics.fertility_married)?;
        check_rates("fertility_unmarried", &self.demographics.fertility_unmarried)?;
        check_rates("job_finding", &self.demographics.job_finding)?;

        if self.employers.is_empty() {
            return Err(SimError::Config("employers table is empty".into()));
        }
        let weight_sum: f64 = self.employers.iter().map(|e| e.seed_weight).sum();
        if weight_sum <= 0.0 {
            return Err(SimError::Config(
                "employer seed weights sum to zero".into(),
            ));
        }
        for employer in &self.employers {
            for &(lo, hi) in &employer.income_bands {
                if lo > hi {
                    return Err(SimError::Config(format!(
                        "employer {} has inverted income band ({lo}, {hi})",
                        employer.name
                    )));
                }
            }
        }

        for stage in [
            EducationStage::Nursery,
            EducationStage::Elementary,
            EducationStage::Middle,
            EducationStage::HighSchool,
            EducationStage::University,
            EducationStage::Masters,
            EducationStage::Phd,
        ] {
            if !self.education_seats.contains_key(&stage) {
                return Err(SimError::Config(format!(
                    "no seat capacity for education stage {stage}"
                )));
            }
        }

        if self.cost_grid.categories.is_empty() {
            return Err(SimError::Config("cost grid has no categories".into()));
        }

        for (i, row) in self.commute.weights.iter().enumerate() {
            if row.iter().sum::<f64>() <= 0.0 {
                return Err(SimError::Config(format!(
                    "commute weight row {i} sums to zero"
                )));
            }
        }

        let h = &self.history;
        let len = h.mortality.len();
        if len < 2 {
            return Err(SimError::Config(
                "history series need at least two observations".into(),
            ));
        }
        for (name, series) in [
            ("birth", &h.birth),
            ("employment", &h.employment),
            ("tax", &h.tax),
            ("salary", &h.salary),
            ("cpi", &h.cpi),
        ] {
            if series.len() != len {
                return Err(SimError::Config(format!(
                    "history series {name} has {} observations, expected {len}",
                    series.len()
                )));
            }
        }

        Ok(())
    }
}

impl Default for Tables {
    fn default() -> Self {
        Tables {
            demographics: DemographicTables {
                death_male: [
                    0.0013, 0.0001, 0.0002, 0.0006, 0.0010, 0.0014, 0.0018, 0.0023, 0.0029,
                    0.0037, 0.0053, 0.0080, 0.0117, 0.0164, 0.0238, 0.0378, 0.0632, 0.15,
                ],
                death_female: [
                    0.0011, 0.0001, 0.0001, 0.0004, 0.0006, 0.0008, 0.0010, 0.0014, 0.0021,
                    0.0028, 0.0041, 0.0063, 0.0097, 0.0139, 0.0204, 0.0335, 0.0577, 0.14,
                ],
                fertility_married: [
                    0.0, 0.0, 0.0, 0.1737, 0.4969, 0.4969, 0.4969, 0.3294, 0.2294, 0.0294, 0.0,
                    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                ],
                fertility_unmarried: [
                    0.0, 0.0, 0.0, 0.180, 0.290, 0.270, 0.130, 0.0510, 0.0001, 0.0, 0.0, 0.0,
                    0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
                ],
                job_finding: [
                    0.0, 0.0, 0.0, 0.2, 0.6, 0.75, 0.8, 0.8, 0.8, 0.78, 0.75, 0.7, 0.6, 0.2,
                    0.1, 0.05, 0.01, 0.0,
                ],
            },
            employers: vec![
                EmployerSpec {
                    id: EmployerId(1),
                    name: "Healthcare System".into(),
                    capacity: 12_750,
                    seed_weight: 0.35,
                    income_bands: [
                        (25_000.0, 38_000.0),
                        (38_000.0, 55_000.0),
                        (55_000.0, 85_000.0),
                        (90_000.0, 250_000.0),
                    ],
                },
                EmployerSpec {
                    id: EmployerId(2),
                    name: "Higher Education".into(),
                    capacity: 6_750,
                    seed_weight: 0.18,
                    income_bands: [
                        (24_000.0, 35_000.0),
                        (35_000.0, 50_000.0),
                        (50_000.0, 75_000.0),
                        (80_000.0, 200_000.0),
                    ],
                },
                EmployerSpec {
                    id: EmployerId(3),
                    name: "City & County Gov.".into(),
                    capacity: 3_750,
                    seed_weight: 0.10,
                    income_bands: [
                        (25_000.0, 36_000.0),
                        (36_000.0, 52_000.0),
                        (52_000.0, 80_000.0),
                        (85_000.0, 160_000.0),
                    ],
                },
                EmployerSpec {
                    id: EmployerId(4),
                    name: "Retail & Hospitality".into(),
                    capacity: 7_500,
                    seed_weight: 0.20,
                    income_bands: [
                        (22_000.0, 32_000.0),
                        (32_000.0, 45_000.0),
                        (45_000.0, 70_000.0),
                        (70_000.0, 140_000.0),
                    ],
                },
                EmployerSpec {
                    id: EmployerId(5),
                    name: "Manufacturing".into(),
                    capacity: 3_000,
                    seed_weight: 0.08,
                    income_bands: [
                        (28_000.0, 40_000.0),
                        (40_000.0, 60_000.0),
                        (58_000.0, 90_000.0),
                        (90_000.0, 180_000.0),
                    ],
                },
                EmployerSpec {
                    id: EmployerId(6),
                    name: "Small Businesses/Other".into(),
                    capacity: 3_750,
                    seed_weight: 0.09,
                    income_bands: [
                        (24_000.0, 35_000.0),
                        (35_000.0, 58_000.0),
                        (50_000.0, 80_000.0),
                        (80_000.0, 200_000.0),
                    ],
                },
            ],
            education_seats: BTreeMap::from([
                (EducationStage::Nursery, 2_500),
                (EducationStage::Elementary, 5_000),
                (EducationStage::Middle, 2_200),
                (EducationStage::HighSchool, 3_200),
                (EducationStage::University, 14_700),
                (EducationStage::Masters, 1_500),
                (EducationStage::Phd, 500),
            ]),
            cost_grid: CostGrid {
                categories: vec![
                    CostCategory {
                        name: "Food".into(),
                        single_adult: [4242.0, 6238.0, 9345.0, 12432.0],
                        two_adults_one_working: [7778.0, 9667.0, 12435.0, 15169.0],
                        two_adults_two_working: [7778.0, 9667.0, 12435.0, 15169.0],
                    },
                    CostCategory {
                        name: "Child Care".into(),
                        single_adult: [0.0, 7614.0, 15229.0, 18211.0],
                        two_adults_one_working: [0.0, 0.0, 0.0, 0.0],
                        two_adults_two_working: [0.0, 7614.0, 15229.0, 18211.0],
                    },
                    CostCategory {
                        name: "Medical".into(),
                        single_adult: [3208.0, 9333.0, 9405.0, 9482.0],
                        two_adults_one_working: [6905.0, 10294.0, 10566.0, 10867.0],
                        two_adults_two_working: [6905.0, 10294.0, 10566.0, 10867.0],
                    },
                    CostCategory {
                        name: "Housing".into(),
                        single_adult: [10725.0, 13484.0, 13484.0, 16738.0],
                        two_adults_one_working: [10785.0, 13484.0, 13484.0, 16738.0],
                        two_adults_two_working: [10785.0, 13484.0, 13484.0, 16738.0],
                    },
                    CostCategory {
                        name: "Transportation".into(),
                        single_adult: [9405.0, 10884.0, 13711.0, 15776.0],
                        two_adults_one_working: [10884.0, 13711.0, 15776.0, 17501.0],
                        two_adults_two_working: [10884.0, 13711.0, 15776.0, 17501.0],
                    },
                    CostCategory {
                        name: "Civic".into(),
                        single_adult: [2589.0, 4557.0, 5031.0, 6450.0],
                        two_adults_one_working: [4557.0, 5031.0, 6450.0, 7156.0],
                        two_adults_two_working: [4557.0, 5031.0, 6450.0, 7156.0],
                    },
                    CostCategory {
                        name: "Internet & Mobile".into(),
                        single_adult: [1557.0, 1557.0, 1557.0, 1557.0],
                        two_adults_one_working: [2139.0, 2139.0, 2139.0, 2139.0],
                        two_adults_two_working: [2139.0, 2139.0, 2139.0, 2139.0],
                    },
                    CostCategory {
                        name: "Other".into(),
                        single_adult: [3770.0, 7242.0, 7587.0, 9120.0],
                        two_adults_one_working: [7242.0, 8033.0, 9120.0, 10117.0],
                        two_adults_two_working: [7242.0, 8033.0, 9120.0, 10117.0],
                    },
                ],
            },
            transit: TransitTables {
                initial_buses: 25,
                initial_population: 73_440,
                bus_capacity: 33,
                trips_per_bus_per_day: 10,
            },
            government: GovernmentTables {
                single_parent_support: 3_000.0,
                food_stamp_per_child: 1_500.0,
                low_income_threshold_factor: 1.25,
                annual_support_cap: 200_000_000.0,
            },
            bank: BankTables {
                savings_annual_cap: 404_000_000.0,
                loans_annual_cap: 350_000_000.0,
            },
            immigration: ImmigrationTables {
                base_annual_rate: 0.005,
                min_age: 22,
                max_age: 35,
                education_mix: vec![
                    (EducationStage::HighSchoolCompleted, 0.4),
                    (EducationStage::UniversityCompleted, 0.6),
                ],
            },
            marriage: MarriageTables {
                base_rate: 0.40,
                groom_min_age: 22,
                max_age_gap: 5,
            },
            vehicles: VehicleTables {
                purchase_income_threshold: 30_000.0,
                purchase_prob_unemployed: 0.10,
                purchase_prob_employed: 0.30,
                retirement_age: 10,
            },
            commute: CommuteTables {
                weights: [
                    [0.0, 0.0, 0.1, 0.2, 0.1, 0.6, 0.0],
                    [0.0, 0.6, 0.1, 0.15, 0.05, 0.1, 0.0],
                    [0.4, 0.3, 0.1, 0.1, 0.05, 0.05, 0.0],
                    [0.6, 0.05, 0.15, 0.05, 0.05, 0.1, 0.0],
                    [0.4, 0.0, 0.2, 0.2, 0.1, 0.1, 0.0],
                    [0.05, 0.0, 0.25, 0.3, 0.3, 0.05, 0.05],
                ],
            },
            history: HistoryTables {
                first_year: 2000,
                mortality: vec![
                    8.03, 8.09, 8.16, 8.08, 7.88, 7.99, 7.76, 7.6, 8.12, 7.89, 7.94, 8.07, 8.4,
                    8.22, 8.24, 8.44, 8.49, 8.64, 8.68, 8.7, 10.4, 10.5, 9.7, 9.2,
                ],
                birth: vec![
                    14.4, 14.1, 13.9, 14.1, 14.0, 14.0, 14.2, 14.3, 13.9, 13.5, 13.0, 12.7,
                    12.6, 12.4, 12.5, 12.4, 12.2, 11.8, 11.6, 11.4, 10.9, 11.0, 11.1, 11.6,
                ],
                employment: vec![
                    96.1, 95.3, 94.2, 94.0, 94.5, 94.9, 95.4, 95.4, 94.2, 90.7, 90.4, 91.1,
                    92.2, 92.6, 93.8, 94.9, 95.1, 95.6, 96.1, 96.3, 89.2, 94.6, 96.4, 96.4,
                ],
                tax: vec![
                    39.6, 39.1, 38.6, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0, 35.0,
                    35.0, 39.6, 39.6, 39.6, 39.6, 39.6, 37.0, 37.0, 37.0, 37.0, 37.0, 37.0,
                ],
                salary: vec![
                    3.7, 4.2, 3.0, 2.4, 2.4, 2.9, 3.9, 3.9, 3.4, 2.2, 1.9, 2.1, 1.9, 2.0, 2.1,
                    2.3, 2.6, 2.7, 2.9, 3.1, 4.6, 4.5, 4.9, 4.3,
                ],
                cpi: vec![
                    3.4, 2.8, 1.6, 2.3, 2.7, 3.4, 3.2, 2.8, 3.8, -0.4, 1.6, 3.2, 2.1, 1.5, 1.6,
                    0.1, 1.3, 2.1, 2.4, 1.8, 1.2, 4.7, 8.0, 4.1,
                ],
            },
        }
    }
}
