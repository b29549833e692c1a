//! Domain records: near-Earth objects and their close approaches.

use chrono::NaiveDateTime;
use std::fmt;

use crate::helpers::datetime_to_str;

/// A near-Earth object as listed in the NEO catalog CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct NearEarthObject {
    pub designation: String,
    pub name: Option<String>,
    /// Diameter in kilometers, if known.
    pub diameter: Option<f64>,
    pub hazardous: bool,
}

impl NearEarthObject {
    /// Builds a record, mapping empty name text to `None`.
    pub fn new(
        designation: impl Into<String>,
        name: Option<String>,
        diameter: Option<f64>,
        hazardous: bool,
    ) -> Self {
        Self {
            designation: designation.into(),
            name: name.filter(|n| !n.is_empty()),
            diameter,
            hazardous,
        }
    }

    /// `"433 (Eros)"` when a name is known, otherwise just the designation.
    pub fn fullname(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.designation, name),
            None => self.designation.clone(),
        }
    }
}

impl fmt::Display for NearEarthObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NEO {} has ", self.fullname())?;
        match self.diameter {
            Some(d) => write!(f, "a diameter of {d:.3} km")?,
            None => write!(f, "an unknown diameter")?,
        }
        let verb = if self.hazardous { "is" } else { "is not" };
        write!(f, " and {verb} potentially hazardous.")
    }
}

/// A single close approach of a NEO to Earth.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseApproach {
    /// Designation of the NEO making the approach.
    pub designation: String,
    pub time: NaiveDateTime,
    /// Nominal approach distance in astronomical units.
    pub distance: f64,
    /// Velocity relative to Earth in km/s.
    pub velocity: f64,
}

impl CloseApproach {
    pub fn time_str(&self) -> String {
        datetime_to_str(&self.time)
    }
}

impl fmt::Display for CloseApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At {}, '{}' approaches Earth at a distance of {:.2} au and a velocity of {:.2} km/s.",
            self.time_str(),
            self.designation,
            self.distance,
            self.velocity
        )
    }
}

/// A close approach paired with the NEO it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct LinkedApproach<'a> {
    pub approach: &'a CloseApproach,
    pub neo: &'a NearEarthObject,
}
