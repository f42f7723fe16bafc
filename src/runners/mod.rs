pub mod fetch;
pub mod probe;
pub mod web;

#[cfg(test)]
mod tests;
