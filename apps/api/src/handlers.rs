pub mod health;
pub mod integrations;
pub mod workflows;

#[cfg(test)]
pub(crate) mod test_support;
