mod fixtures;

use fixtures::rig;
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().enable_all().build().expect("runtime")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn stored_values_read_back(
        entry_id in "\\PC{0,32}",
        secret in "\\PC{0,16}",
        value in "\\PC{0,256}",
    ) {
        let read = runtime().block_on(async {
            let rig = rig().await;
            let ns = rig.vault.namespace("prop", false).unwrap();
            rig.vault.set(&ns, &entry_id, &secret, &value).await.unwrap();
            rig.vault.get(&ns, &entry_id, &secret).await.unwrap()
        });
        prop_assert_eq!(read, value);
    }

    #[test]
    fn other_entry_ids_are_not_found(
        entry_id in "[a-z]{1,16}",
        other in "[A-Z]{1,16}",
    ) {
        let kind = runtime().block_on(async {
            let rig = rig().await;
            let ns = rig.vault.namespace("prop", false).unwrap();
            rig.vault.set(&ns, &entry_id, "", "v").await.unwrap();
            rig.vault.get(&ns, &other, "").await.unwrap_err().kind()
        });
        prop_assert_eq!(kind, "EntryNotFound");
    }
}
