//! Specialty ward: a fixed rooms × beds matrix with gender-segregated rooms.
//!
//! Allocation prefers a room that already holds someone of the same gender
//! and has a free bed; otherwise it opens the first entirely empty room.
//! A patient of the other gender is never placed in a room that already
//! has an occupant.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::patient::{BedLocation, Patient};
use crate::core::registry::PatientArena;
use crate::core::staff::Nurse;
use crate::core::FacilityError;
use crate::util::serde::{Gender, NurseId, PatientId, Specialty};

/// Contents of an occupied bed.
///
/// The gender is copied in at admission; it never changes, so the ward can
/// apply the segregation rule without reaching into the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Back-reference to the arena entry.
    pub patient: PatientId,
    /// Occupant's gender.
    pub gender: Gender,
}

/// One medication hand-out from a medication round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicationDose {
    /// Nurse on duty for the room.
    pub nurse: NurseId,
    /// Nurse's name.
    pub nurse_name: String,
    /// Patient receiving the dose.
    pub patient: PatientId,
    /// Ward specialty.
    pub ward: Specialty,
    /// Room index.
    pub room: usize,
}

/// A specialty ward and its bed matrix.
#[derive(Debug, Clone)]
pub struct Ward {
    specialty: Specialty,
    rooms: Vec<Vec<Option<Occupant>>>,
    nurses: Vec<Nurse>,
    discharge_next_cycle: usize,
}

impl Ward {
    /// Build an empty ward.
    ///
    /// # Errors
    ///
    /// [`FacilityError::Configuration`] if `rooms` or `beds_per_room` is zero.
    pub fn new(specialty: Specialty, rooms: usize, beds_per_room: usize) -> Result<Self, FacilityError> {
        if rooms == 0 || beds_per_room == 0 {
            return Err(FacilityError::Configuration(format!(
                "ward {specialty} needs at least one room and one bed (got {rooms}x{beds_per_room})"
            )));
        }
        Ok(Self {
            specialty,
            rooms: vec![vec![None; beds_per_room]; rooms],
            nurses: Vec::new(),
            discharge_next_cycle: 0,
        })
    }

    /// Specialty this ward serves.
    #[must_use]
    pub const fn specialty(&self) -> Specialty {
        self.specialty
    }

    /// Number of rooms.
    #[must_use]
    pub fn rooms(&self) -> usize {
        self.rooms.len()
    }

    /// Beds in each room.
    #[must_use]
    pub fn beds_per_room(&self) -> usize {
        self.rooms.first().map_or(0, Vec::len)
    }

    /// Total beds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.rooms.iter().map(Vec::len).sum()
    }

    /// Beds holding nobody.
    #[must_use]
    pub fn free_beds(&self) -> usize {
        self.cells().filter(|cell| cell.is_none()).count()
    }

    /// Beds holding a patient.
    #[must_use]
    pub fn occupied_beds(&self) -> usize {
        self.cells().filter(|cell| cell.is_some()).count()
    }

    /// Patients whose countdown reached zero at the last [`Ward::advance_day`].
    #[must_use]
    pub const fn discharge_next_cycle(&self) -> usize {
        self.discharge_next_cycle
    }

    /// Nurses assigned here.
    #[must_use]
    pub fn nurses(&self) -> &[Nurse] {
        &self.nurses
    }

    /// Add a nurse to the rotation.
    pub fn assign_nurse(&mut self, nurse: Nurse) {
        self.nurses.push(nurse);
    }

    /// Room and bed of `patient`, if it is in this ward.
    #[must_use]
    pub fn location_of(&self, patient: PatientId) -> Option<BedLocation> {
        self.occupants()
            .find(|(_, occupant)| occupant.patient == patient)
            .map(|(location, _)| location)
    }

    /// Every occupied bed with its occupant, room-major order.
    pub fn occupants(&self) -> impl Iterator<Item = (BedLocation, Occupant)> + '_ {
        let ward = self.specialty;
        self.rooms.iter().enumerate().flat_map(move |(room, beds)| {
            beds.iter().enumerate().filter_map(move |(bed, cell)| {
                cell.map(|occupant| (BedLocation { ward, room, bed }, occupant))
            })
        })
    }

    /// Occupants of a single room.
    #[must_use]
    pub fn room_occupants(&self, room: usize) -> Vec<Occupant> {
        self.rooms
            .get(room)
            .map(|beds| beds.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// Try to give `patient` a bed.
    ///
    /// Returns `Ok(None)` when no room can take the patient; nothing changes
    /// in that case. On success the location is also recorded on the patient.
    ///
    /// # Errors
    ///
    /// [`FacilityError::ConcurrencyHazard`] if the patient already has a bed or
    /// belongs to another specialty.
    pub fn try_admit(&mut self, patient: &mut Patient) -> Result<Option<BedLocation>, FacilityError> {
        if let Some(bed) = patient.bed {
            return Err(FacilityError::ConcurrencyHazard(format!(
                "patient {} already occupies {:?}",
                patient.id, bed
            )));
        }
        if patient.profile.specialty != self.specialty {
            return Err(FacilityError::ConcurrencyHazard(format!(
                "patient {} needs {} but was routed to {}",
                patient.id, patient.profile.specialty, self.specialty
            )));
        }
        if let Some(existing) = self.location_of(patient.id) {
            return Err(FacilityError::ConcurrencyHazard(format!(
                "patient {} found in bed {:?} without a recorded location",
                patient.id, existing
            )));
        }

        let gender = patient.profile.gender;
        let Some((room, bed)) = self.pick_bed(gender) else {
            debug!(ward = %self.specialty, patient = %patient.id, %gender, "no compatible bed");
            return Ok(None);
        };

        self.rooms[room][bed] = Some(Occupant {
            patient: patient.id,
            gender,
        });
        let location = BedLocation {
            ward: self.specialty,
            room,
            bed,
        };
        patient.bed = Some(location);
        Ok(Some(location))
    }

    /// Room-major scan: same-gender room with a free bed first, else the
    /// first empty room at bed 0.
    fn pick_bed(&self, gender: Gender) -> Option<(usize, usize)> {
        let mut empty_room = None;
        for (room, beds) in self.rooms.iter().enumerate() {
            let first_free = beds.iter().position(Option::is_none);
            let same_gender = beds.iter().flatten().any(|o| o.gender == gender);
            match first_free {
                Some(bed) if same_gender => return Some((room, bed)),
                Some(_) if empty_room.is_none() && beds.iter().all(Option::is_none) => {
                    empty_room = Some(room);
                }
                _ => {}
            }
        }
        empty_room.map(|room| (room, 0))
    }

    /// Clear the bed held by `patient`. Returns false, with a warning, if the
    /// patient is not in this ward.
    pub fn release(&mut self, patient: PatientId) -> bool {
        for beds in &mut self.rooms {
            for cell in beds.iter_mut() {
                if cell.is_some_and(|o| o.patient == patient) {
                    *cell = None;
                    return true;
                }
            }
        }
        warn!(ward = %self.specialty, %patient, "release requested for a patient not in this ward");
        false
    }

    /// Advance every occupant's countdown by one day.
    ///
    /// Positive counts are decremented; reaching exactly zero adds to the
    /// discharge-next-cycle counter. Occupants already at zero or below when
    /// the call starts are discharged: their bed is cleared and they are
    /// returned. The counter is reset before anything else.
    ///
    /// A bed that refers to a patient the arena does not hold is cleared and
    /// reported as a [`FacilityError::ConcurrencyHazard`] in the second list;
    /// the scan carries on, so everyone else is still counted down or
    /// discharged.
    pub fn advance_day(&mut self, arena: &mut PatientArena) -> (Vec<PatientId>, Vec<FacilityError>) {
        self.discharge_next_cycle = 0;
        let mut due_tomorrow = 0;
        let mut discharged = Vec::new();
        let mut hazards = Vec::new();

        for (room, beds) in self.rooms.iter_mut().enumerate() {
            for cell in beds.iter_mut() {
                let Some(occupant) = *cell else { continue };
                let Some(patient) = arena.get_mut(occupant.patient) else {
                    error!(ward = %self.specialty, room, patient = %occupant.patient, "bed held by unknown patient, clearing");
                    *cell = None;
                    hazards.push(FacilityError::ConcurrencyHazard(format!(
                        "ward {} room {room} held {} which is not in the arena",
                        self.specialty, occupant.patient
                    )));
                    continue;
                };

                if patient.remaining_days > 0 {
                    patient.remaining_days -= 1;
                    if patient.remaining_days == 0 {
                        due_tomorrow += 1;
                    }
                } else {
                    info!(
                        ward = %self.specialty,
                        patient = %patient.id,
                        name = %patient.profile.name,
                        gender = %patient.profile.gender,
                        "patient discharged"
                    );
                    patient.bed = None;
                    *cell = None;
                    discharged.push(occupant.patient);
                }
            }
        }

        self.discharge_next_cycle = due_tomorrow;
        (discharged, hazards)
    }

    /// Medication round: room `i` is served by nurse `i mod nurse_count`.
    ///
    /// Stateless apart from the returned doses. Without nurses nothing is
    /// handed out.
    #[must_use]
    pub fn medication_round(&self) -> Vec<MedicationDose> {
        if self.nurses.is_empty() {
            warn!(ward = %self.specialty, "no nurse on duty for medication round");
            return Vec::new();
        }

        let mut doses = Vec::new();
        for (room, beds) in self.rooms.iter().enumerate() {
            let nurse = &self.nurses[room % self.nurses.len()];
            for occupant in beds.iter().flatten() {
                debug!(ward = %self.specialty, room, nurse = %nurse.name, patient = %occupant.patient, "medication given");
                doses.push(MedicationDose {
                    nurse: nurse.id,
                    nurse_name: nurse.name.clone(),
                    patient: occupant.patient,
                    ward: self.specialty,
                    room,
                });
            }
        }
        doses
    }

    fn cells(&self) -> impl Iterator<Item = &Option<Occupant>> {
        self.rooms.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::patient::PatientProfile;

    fn admit(ward: &mut Ward, arena: &mut PatientArena, name: &str, gender: Gender) -> (PatientId, Option<BedLocation>) {
        let id = arena.insert(PatientProfile::new(name, gender, ward.specialty()));
        let bed = ward.try_admit(arena.get_mut(id).unwrap()).unwrap();
        (id, bed)
    }

    fn nurse(id: u32, name: &str) -> Nurse {
        Nurse {
            id: NurseId(id),
            name: name.into(),
            years_of_experience: 4,
            phone: String::new(),
        }
    }

    #[test]
    fn test_zero_sized_ward_is_rejected() {
        assert!(matches!(Ward::new(Specialty::Virology, 0, 3), Err(FacilityError::Configuration(_))));
        assert!(matches!(Ward::new(Specialty::Virology, 3, 0), Err(FacilityError::Configuration(_))));
    }

    #[test]
    fn test_single_room_gender_scenario() {
        let mut ward = Ward::new(Specialty::Cardiology, 1, 2).unwrap();
        let mut arena = PatientArena::new();

        let (a, bed_a) = admit(&mut ward, &mut arena, "A", Gender::Male);
        assert_eq!(bed_a, Some(BedLocation { ward: Specialty::Cardiology, room: 0, bed: 0 }));
        assert_eq!(arena.get(a).unwrap().bed, bed_a);

        let (b, bed_b) = admit(&mut ward, &mut arena, "B", Gender::Female);
        assert_eq!(bed_b, None);
        assert_eq!(arena.get(b).unwrap().bed, None);
        assert_eq!(ward.occupied_beds(), 1);

        let (_, bed_c) = admit(&mut ward, &mut arena, "C", Gender::Male);
        assert_eq!(bed_c, Some(BedLocation { ward: Specialty::Cardiology, room: 0, bed: 1 }));
        assert_eq!(ward.free_beds(), 0);
    }

    #[test]
    fn test_prefers_same_gender_room_over_empty_room() {
        let mut ward = Ward::new(Specialty::Orthopedics, 3, 3).unwrap();
        let mut arena = PatientArena::new();

        admit(&mut ward, &mut arena, "m1", Gender::Male);
        let (_, f1) = admit(&mut ward, &mut arena, "f1", Gender::Female);
        assert_eq!(f1.unwrap().room, 1);

        let (_, m2) = admit(&mut ward, &mut arena, "m2", Gender::Male);
        assert_eq!((m2.unwrap().room, m2.unwrap().bed), (0, 1));
        let (_, f2) = admit(&mut ward, &mut arena, "f2", Gender::Female);
        assert_eq!((f2.unwrap().room, f2.unwrap().bed), (1, 1));
    }

    #[test]
    fn test_first_free_bed_is_reused_after_release() {
        let mut ward = Ward::new(Specialty::Orthopedics, 1, 3).unwrap();
        let mut arena = PatientArena::new();
        let (first, _) = admit(&mut ward, &mut arena, "m1", Gender::Male);
        admit(&mut ward, &mut arena, "m2", Gender::Male);

        assert!(ward.release(first));
        assert!(!ward.release(first));

        let (_, bed) = admit(&mut ward, &mut arena, "m3", Gender::Male);
        assert_eq!(bed.unwrap().bed, 0);
    }

    #[test]
    fn test_lone_occupant_blocks_other_gender_when_no_empty_room() {
        let mut ward = Ward::new(Specialty::Virology, 2, 2).unwrap();
        let mut arena = PatientArena::new();
        admit(&mut ward, &mut arena, "m", Gender::Male);
        admit(&mut ward, &mut arena, "f", Gender::Female);

        // both rooms have one occupant and a free bed, but neither is empty
        let (_, third) = admit(&mut ward, &mut arena, "m2", Gender::Male);
        assert_eq!(third.unwrap().room, 0);
        let (_, fourth) = admit(&mut ward, &mut arena, "f2", Gender::Female);
        assert_eq!(fourth.unwrap().room, 1);
        let (_, none) = admit(&mut ward, &mut arena, "m3", Gender::Male);
        assert!(none.is_none());
    }

    #[test]
    fn test_rooms_stay_single_gender_and_beds_add_up() {
        let mut ward = Ward::new(Specialty::Cardiology, 4, 3).unwrap();
        let mut arena = PatientArena::new();
        for i in 0..20 {
            let gender = if i % 3 == 0 { Gender::Female } else { Gender::Male };
            admit(&mut ward, &mut arena, &format!("p{i}"), gender);
            assert_eq!(ward.free_beds() + ward.occupied_beds(), ward.capacity());
        }
        for room in 0..ward.rooms() {
            let occupants = ward.room_occupants(room);
            if occupants.len() >= 2 {
                assert!(occupants.iter().all(|o| o.gender == occupants[0].gender));
            }
        }
    }

    #[test]
    fn test_double_admission_is_a_hazard() {
        let mut ward = Ward::new(Specialty::Cardiology, 2, 2).unwrap();
        let mut arena = PatientArena::new();
        let (id, _) = admit(&mut ward, &mut arena, "A", Gender::Male);
        let err = ward.try_admit(arena.get_mut(id).unwrap()).unwrap_err();
        assert!(err.is_hazard());
        assert_eq!(ward.occupied_beds(), 1);
    }

    #[test]
    fn test_wrong_specialty_is_a_hazard() {
        let mut ward = Ward::new(Specialty::Cardiology, 1, 1).unwrap();
        let mut arena = PatientArena::new();
        let id = arena.insert(PatientProfile::new("A", Gender::Male, Specialty::Virology));
        assert!(ward.try_admit(arena.get_mut(id).unwrap()).is_err());
    }

    #[test]
    fn test_countdown_then_discharge() {
        let mut ward = Ward::new(Specialty::Virology, 1, 2).unwrap();
        let mut arena = PatientArena::new();
        let (id, _) = admit(&mut ward, &mut arena, "A", Gender::Female);
        arena.get_mut(id).unwrap().remaining_days = 1;

        let (out, _) = ward.advance_day(&mut arena);
        assert!(out.is_empty());
        assert_eq!(arena.get(id).unwrap().remaining_days, 0);
        assert_eq!(ward.discharge_next_cycle(), 1);
        assert_eq!(ward.occupied_beds(), 1);

        let (out, _) = ward.advance_day(&mut arena);
        assert_eq!(out, vec![id]);
        assert_eq!(ward.occupied_beds(), 0);
        assert_eq!(ward.discharge_next_cycle(), 0);
        assert_eq!(arena.get(id).unwrap().bed, None);
    }

    #[test]
    fn test_untreated_patient_is_discharged_on_first_tick() {
        let mut ward = Ward::new(Specialty::Virology, 1, 1).unwrap();
        let mut arena = PatientArena::new();
        let (id, _) = admit(&mut ward, &mut arena, "A", Gender::Female);
        assert_eq!(ward.advance_day(&mut arena).0, vec![id]);
    }

    #[test]
    fn test_empty_ward_tick_only_resets_counter() {
        let mut ward = Ward::new(Specialty::Virology, 2, 2).unwrap();
        let mut arena = PatientArena::new();
        let (id, _) = admit(&mut ward, &mut arena, "A", Gender::Female);
        arena.get_mut(id).unwrap().remaining_days = 1;
        ward.advance_day(&mut arena);
        assert_eq!(ward.discharge_next_cycle(), 1);
        ward.release(id);

        let (out, _) = ward.advance_day(&mut arena);
        assert!(out.is_empty());
        assert_eq!(ward.discharge_next_cycle(), 0);
        assert_eq!(ward.free_beds(), 4);
    }

    #[test]
    fn test_orphaned_bed_is_reported() {
        let mut ward = Ward::new(Specialty::Virology, 1, 1).unwrap();
        let mut arena = PatientArena::new();
        let (id, _) = admit(&mut ward, &mut arena, "A", Gender::Female);
        arena.remove(id);
        let (out, hazards) = ward.advance_day(&mut arena);
        assert!(out.is_empty());
        assert_eq!(hazards.len(), 1);
        assert!(hazards[0].is_hazard());
        assert_eq!(ward.occupied_beds(), 0);
    }

    #[test]
    fn test_orphaned_bed_does_not_stop_discharge() {
        let mut ward = Ward::new(Specialty::Virology, 3, 1).unwrap();
        let mut arena = PatientArena::new();
        let (due, _) = admit(&mut ward, &mut arena, "A", Gender::Female);
        let (gone, _) = admit(&mut ward, &mut arena, "B", Gender::Male);
        let (staying, _) = admit(&mut ward, &mut arena, "C", Gender::Male);
        arena.get_mut(staying).unwrap().remaining_days = 2;
        arena.remove(gone);

        let (out, hazards) = ward.advance_day(&mut arena);
        assert_eq!(out, vec![due]);
        assert_eq!(hazards.len(), 1);
        assert_eq!(arena.get(due).unwrap().bed, None);
        assert_eq!(arena.get(staying).unwrap().remaining_days, 1);
        assert_eq!(ward.occupied_beds(), 1);
        assert_eq!(ward.free_beds() + ward.occupied_beds(), ward.capacity());
    }

    #[test]
    fn test_medication_round_robin() {
        let mut ward = Ward::new(Specialty::Orthopedics, 3, 1).unwrap();
        let mut arena = PatientArena::new();
        assert!(ward.medication_round().is_empty());

        ward.assign_nurse(nurse(0, "Reyes"));
        ward.assign_nurse(nurse(1, "Kim"));
        for name in ["a", "b", "c"] {
            admit(&mut ward, &mut arena, name, Gender::Male);
        }
        // single-bed rooms: each admission opens the next room
        let doses = ward.medication_round();
        let nurses: Vec<_> = doses.iter().map(|d| (d.room, d.nurse)).collect();
        assert_eq!(nurses, vec![(0, NurseId(0)), (1, NurseId(1)), (2, NurseId(0))]);
    }
}
