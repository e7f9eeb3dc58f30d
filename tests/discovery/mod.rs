mod registry_snapshot;
