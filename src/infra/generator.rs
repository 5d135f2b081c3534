//! Random arrivals and staff for demos, benches and load tests.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

use crate::config::DoctorConfig;
use crate::core::PatientProfile;
use crate::util::serde::{Gender, Specialty};

const FEMALE_NAMES: &[&str] = &[
    "Astrid", "Beatriz", "Chiara", "Dalia", "Elif", "Freya", "Greta", "Hana", "Ines", "Jun",
];
const MALE_NAMES: &[&str] = &[
    "Anders", "Bruno", "Caspar", "Dmitri", "Emeka", "Felix", "Goran", "Hugo", "Ivo", "Joaquin",
];
const SURNAMES: &[&str] = &[
    "Achterberg", "Bianchi", "Cervantes", "Delacroix", "Eriksen", "Fontaine", "Gallo", "Holm",
];

/// Source of arriving patient profiles.
pub trait PatientGenerator {
    /// Produce the next arrival.
    fn next_profile(&mut self) -> PatientProfile;
}

/// Uniformly random arrivals from a seeded RNG.
#[derive(Debug, Clone)]
pub struct RandomPatientGenerator {
    rng: StdRng,
    specialties: Vec<Specialty>,
}

impl RandomPatientGenerator {
    /// Generator over every specialty. A seed makes the stream reproducible.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64),
            specialties: Specialty::ALL.to_vec(),
        }
    }

    /// Restrict arrivals to `specialties`; an empty slice keeps the current set.
    #[must_use]
    pub fn with_specialties(mut self, specialties: &[Specialty]) -> Self {
        if !specialties.is_empty() {
            self.specialties = specialties.to_vec();
        }
        self
    }
}

impl PatientGenerator for RandomPatientGenerator {
    fn next_profile(&mut self) -> PatientProfile {
        let gender = if self.rng.random_bool(0.5) {
            Gender::Female
        } else {
            Gender::Male
        };
        let given = match gender {
            Gender::Female => FEMALE_NAMES,
            Gender::Male => MALE_NAMES,
        };
        let name = format!(
            "{} {}",
            given.choose(&mut self.rng).copied().unwrap_or("Alex"),
            SURNAMES.choose(&mut self.rng).copied().unwrap_or("Doe")
        );
        let specialty = self
            .specialties
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(Specialty::Cardiology);
        PatientProfile {
            name,
            phone: format!("555-{:04}", self.rng.random_range(0..10_000)),
            age: self.rng.random_range(1..=99),
            gender,
            specialty,
        }
    }
}

/// `count` doctors with random specialties. Some specialty may end up with
/// no doctor at all, which the engine reports as rejections.
pub fn random_doctors<R: Rng>(count: usize, rng: &mut R) -> Vec<DoctorConfig> {
    (0..count)
        .map(|i| DoctorConfig {
            name: format!(
                "{}-{i}",
                SURNAMES.choose(rng).copied().unwrap_or("Doctor")
            ),
            specialty: Specialty::ALL.choose(rng).copied().unwrap_or(Specialty::Cardiology),
            phone: format!("555-{:04}", rng.random_range(0..10_000)),
        })
        .collect()
}
