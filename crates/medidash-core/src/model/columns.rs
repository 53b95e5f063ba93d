//! Column tables shared by every view of a given entity.

use super::{Appointment, Patient, StatusTone};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// A table column: header, alignment and a formatter for the cell text.
///
/// `tone` is set on badge columns so renderers can color the cell.
pub struct Column<R> {
    pub id: &'static str,
    pub label: &'static str,
    pub align: Align,
    pub format: fn(&R) -> String,
    pub tone: Option<fn(&R) -> StatusTone>,
}

impl<R> Column<R> {
    pub fn render(&self, row: &R) -> String {
        (self.format)(row)
    }

    pub fn tone_of(&self, row: &R) -> Option<StatusTone> {
        self.tone.map(|tone| tone(row))
    }
}

impl<R> std::fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Column")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("align", &self.align)
            .finish()
    }
}

pub const APPOINTMENT_COLUMNS: &[Column<Appointment>] = &[
    Column {
        id: "patientName",
        label: "Patient Name",
        align: Align::Left,
        format: |a| a.patient_name.clone(),
        tone: None,
    },
    Column {
        id: "doctorName",
        label: "Doctor Name",
        align: Align::Left,
        format: |a| a.doctor_name.clone(),
        tone: None,
    },
    Column {
        id: "department",
        label: "Department",
        align: Align::Left,
        format: |a| a.department.clone(),
        tone: None,
    },
    Column {
        id: "appointmentTime",
        label: "Time",
        align: Align::Center,
        format: |a| a.appointment_time.clone(),
        tone: None,
    },
    Column {
        id: "status",
        label: "Status",
        align: Align::Center,
        format: |a| a.status.to_string(),
        tone: Some(|a| a.status.tone()),
    },
];

pub const PATIENT_COLUMNS: &[Column<Patient>] = &[
    Column {
        id: "id",
        label: "ID",
        align: Align::Center,
        format: |p| p.id.to_string(),
        tone: None,
    },
    Column {
        id: "patientName",
        label: "Patient Name",
        align: Align::Left,
        format: |p| p.display_name().to_string(),
        tone: None,
    },
    Column {
        id: "gender",
        label: "Gender",
        align: Align::Center,
        format: |p| p.gender.clone(),
        tone: None,
    },
    Column {
        id: "age",
        label: "Age",
        align: Align::Center,
        format: |p| p.age.to_string(),
        tone: None,
    },
    Column {
        id: "contact",
        label: "Contact",
        align: Align::Left,
        format: |p| p.contact.clone(),
        tone: None,
    },
    Column {
        id: "admissionDate",
        label: "Admission Date",
        align: Align::Center,
        format: |p| p.admission_display(),
        tone: None,
    },
    Column {
        id: "roomNumber",
        label: "Room Number",
        align: Align::Center,
        format: |p| p.room_number.clone(),
        tone: None,
    },
    Column {
        id: "appointmentStatus",
        label: "Status",
        align: Align::Center,
        format: |p| p.appointment_status.to_string(),
        tone: Some(|p| p.appointment_status.tone()),
    },
];
