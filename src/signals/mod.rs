pub mod categorical;
pub mod fields;
pub mod hypotheses;
pub mod numeric;
pub mod population;
