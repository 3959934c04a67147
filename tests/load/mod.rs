mod concurrent_triggers;
