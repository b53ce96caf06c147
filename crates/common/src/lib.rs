pub mod types;
pub mod utils;
pub mod env;
pub mod metrics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_type_ok() {
        let h = types::Health { status: "ok", store: "memory" };
        assert_eq!(h.status, "ok");
        assert_eq!(h.store, "memory");
    }
}
