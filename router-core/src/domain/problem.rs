//! Problem domain types

use serde::{Deserialize, Serialize};

/// A point on the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Any addressable stop of a problem (depot or customer)
///
/// Matrices are keyed by `id`, so ids must be unique across depots and customers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn coordinate(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Depot {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub demand: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    pub capacity: u32,
    pub depot: Depot,
}

impl From<&Depot> for Location {
    fn from(depot: &Depot) -> Self {
        Self {
            id: depot.id,
            name: depot.name.clone(),
            lat: depot.lat,
            lng: depot.lng,
        }
    }
}

impl From<&Customer> for Location {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            name: customer.name.clone(),
            lat: customer.lat,
            lng: customer.lng,
        }
    }
}

/// A capacitated vehicle-routing problem instance
///
/// This is the input every solver receives, wrapped in a [`crate::domain::Solution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub name: String,
    pub vehicles: Vec<Vehicle>,
    pub customers: Vec<Customer>,
}

impl Problem {
    /// Distinct depots referenced by the fleet, in first-seen order
    pub fn depots(&self) -> Vec<&Depot> {
        let mut depots: Vec<&Depot> = Vec::new();
        for vehicle in &self.vehicles {
            if !depots.iter().any(|d| d.id == vehicle.depot.id) {
                depots.push(&vehicle.depot);
            }
        }
        depots
    }

    /// Depots followed by customers
    pub fn locations(&self) -> Vec<Location> {
        self.depots()
            .into_iter()
            .map(Location::from)
            .chain(self.customers.iter().map(Location::from))
            .collect()
    }

    pub fn num_locations(&self) -> usize {
        self.depots().len() + self.customers.len()
    }

    pub fn num_vehicles(&self) -> usize {
        self.vehicles.len()
    }
}
