use crate::models::Doctor;

pub const DOCTORS: [Doctor; 2] = [
    Doctor {
        id: "dr-marshall",
        name: "Andre P. Marshall",
        title: "M.D., MPH, F.A.C.S.",
        specialties: &["Rhinoplasty", "Facelift", "Lip Fillers"],
    },
    Doctor {
        id: "dr-loflin",
        name: "Catherine Loflin",
        title: "MD, FACS",
        specialties: &["Upper Arm Lift", "Tummy Tuck", "Facelift"],
    },
];

/// Used in patient-facing text when a doctor id is not in the directory.
pub const UNKNOWN_DOCTOR_NAME: &str = "the doctor";

pub fn find_doctor(doctor_id: &str) -> Option<&'static Doctor> {
    DOCTORS.iter().find(|doctor| doctor.id == doctor_id)
}

pub fn doctor_name(doctor_id: &str) -> &'static str {
    find_doctor(doctor_id)
        .map(|doctor| doctor.name)
        .unwrap_or(UNKNOWN_DOCTOR_NAME)
}

pub fn doctor_ids() -> Vec<&'static str> {
    DOCTORS.iter().map(|doctor| doctor.id).collect()
}

pub fn doctors_offering(treatment: &str) -> Vec<&'static Doctor> {
    DOCTORS.iter().filter(|doctor| doctor.offers(treatment)).collect()
}
