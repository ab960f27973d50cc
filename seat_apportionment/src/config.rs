// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A state, region or any other entity that receives seats.
///
/// The population is a non-negative count. Names must be unique within one
/// apportionment.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Entity {
    pub name: String,
    pub population: u64,
}

impl Entity {
    pub fn new(name: &str, population: u64) -> Entity {
        Entity {
            name: name.to_string(),
            population,
        }
    }
}

// ******** Output data structures *********

/// The final allocation for one entity.
#[derive(PartialEq, Debug, Clone)]
pub struct EntitySeats {
    pub name: String,
    pub population: u64,
    pub seats: u32,
    /// The exact proportional share of the house: `population * seats / total population`.
    pub quota: f64,
}

/// One seat awarded by the priority method, in the order it was awarded.
#[derive(PartialEq, Debug, Clone)]
pub struct SeatAssignment {
    /// The seat number in the house, starting at 1.
    pub seat: u32,
    pub name: String,
    /// The priority value that won this seat.
    pub priority: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct ApportionmentResult {
    pub method: ApportionmentMethod,
    pub total_seats: u32,
    /// The allocations, in the same order as the input entities.
    pub seats: Vec<EntitySeats>,
    /// All the seats awarded beyond the minimum allocation.
    /// Empty for the Hamilton method.
    pub priority_list: Vec<SeatAssignment>,
}

/// Errors that prevent the apportionment from being computed.
///
/// All of them are detected before any seat is allocated.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ApportionmentErrors {
    /// No entity was provided.
    EmptyInput,
    /// The house is too small to give every entity its minimum number of seats.
    NotEnoughSeats {
        seats: u32,
        entities: usize,
        minimum_seats: u32,
    },
    EmptyEntityName,
    DuplicateEntity(String),
    /// A quota method cannot divide by a total population of zero.
    ZeroTotalPopulation,
}

impl Error for ApportionmentErrors {}

impl Display for ApportionmentErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApportionmentErrors::EmptyInput => {
                write!(f, "no valid entities with a population were provided")
            }
            ApportionmentErrors::NotEnoughSeats {
                seats,
                entities,
                minimum_seats,
            } => write!(
                f,
                "{} seats cannot give {} seat(s) to each of the {} entities",
                seats, minimum_seats, entities
            ),
            ApportionmentErrors::EmptyEntityName => write!(f, "an entity has an empty name"),
            ApportionmentErrors::DuplicateEntity(name) => {
                write!(f, "entity {:?} appears more than once", name)
            }
            ApportionmentErrors::ZeroTotalPopulation => {
                write!(f, "the total population is zero")
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ApportionmentMethod {
    /// The priority (divisor) method with the geometric mean `sqrt(s * (s + 1))`.
    /// It is the method used for the U.S. House of Representatives since 1941.
    HuntingtonHill,
    /// Largest remainder method, also known as Hamilton-Vinton.
    Hamilton,
}

/// How to order entities that have exactly the same priority.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Larger population first, then fewer seats, then names in ascending order.
    LargestPopulationThenName,
    /// Fewer seats first, then the order in which the entities were provided.
    UseEntityOrder,
    // Note: the permutation is derived from a cryptographic hash of the seed and
    // the entity names, so that it is reproducible across platforms.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ApportionmentRules {
    pub method: ApportionmentMethod,
    /// The number of seats every entity receives before the priority rounds.
    /// Only used by the divisor methods.
    pub minimum_seats: u32,
    pub tiebreak_mode: TieBreakMode,
}

impl ApportionmentRules {
    pub const DEFAULT_RULES: ApportionmentRules = ApportionmentRules {
        method: ApportionmentMethod::HuntingtonHill,
        minimum_seats: 1,
        tiebreak_mode: TieBreakMode::LargestPopulationThenName,
    };

    pub const HAMILTON_RULES: ApportionmentRules = ApportionmentRules {
        method: ApportionmentMethod::Hamilton,
        minimum_seats: 0,
        tiebreak_mode: TieBreakMode::LargestPopulationThenName,
    };
}

impl Default for ApportionmentRules {
    fn default() -> Self {
        ApportionmentRules::DEFAULT_RULES
    }
}
