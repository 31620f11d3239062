use questbot::rpg::{EquipSlot, GameError};

mod common;

#[tokio::test]
async fn buying_debits_coins_and_adds_item() {
    let h = common::memory_harness(10);
    h.engine.start("buyer").await.expect("start");
    let result = h.engine.buy("buyer", "health potion").await.expect("buy");
    assert!(result.success);
    assert_eq!(result.deltas.coins, -25);
    assert_eq!(result.deltas.items_gained, vec!["Health Potion".to_string()]);

    let record = h.store.get("buyer").expect("get");
    assert_eq!(record.coins, 75);
    assert_eq!(record.inventory, vec!["Health Potion".to_string()]);
}

#[tokio::test]
async fn rejected_purchases_leave_the_record_untouched() {
    let h = common::memory_harness(11);
    h.engine.start("poor").await.expect("start");
    let before = h.store.get("poor").expect("get");

    match h.engine.buy("poor", "Steel Sword").await {
        Err(GameError::InsufficientFunds { needed, available }) => {
            assert_eq!(needed, 1500);
            assert_eq!(available, 100);
        }
        other => panic!("expected insufficient funds, got {:?}", other),
    }
    assert!(matches!(
        h.engine.buy("poor", "Enchanted Blade").await,
        Err(GameError::ItemNotFound(_))
    ));
    assert_eq!(h.store.get("poor").expect("get"), before);
}

#[tokio::test]
async fn full_inventory_blocks_purchases() {
    let h = common::memory_harness(12);
    h.engine.start("hoarder").await.expect("start");
    common::edit_record(&h.store, "hoarder", |r| {
        r.inventory = vec!["Health Potion".to_string(); 50];
    });
    assert!(matches!(
        h.engine.buy("hoarder", "Health Potion").await,
        Err(GameError::InventoryFull { capacity: 50 })
    ));
}

#[tokio::test]
async fn selling_pays_sixty_percent_of_list_price() {
    let h = common::memory_harness(13);
    h.engine.start("seller").await.expect("start");
    common::edit_record(&h.store, "seller", |r| r.inventory.push("Iron Sword".into()));
    let result = h.engine.sell("seller", "IRON SWORD").await.expect("sell");
    assert_eq!(result.deltas.coins, 300);
    let record = h.store.get("seller").expect("get");
    assert_eq!(record.coins, 400);
    assert!(record.inventory.is_empty());
}

#[tokio::test]
async fn unknown_loot_sells_in_fallback_range() {
    let h = common::memory_harness(14);
    h.engine.start("looter").await.expect("start");
    common::edit_record(&h.store, "looter", |r| r.inventory.push("Odd Pebble".into()));
    let result = h.engine.sell("looter", "odd pebble").await.expect("sell");
    assert!((10..=50).contains(&result.deltas.coins));
}

#[tokio::test]
async fn equipping_swaps_exact_bonuses() {
    let h = common::memory_harness(15);
    h.engine.start("knight").await.expect("start");
    common::edit_record(&h.store, "knight", |r| {
        r.inventory.push("Wooden Sword".into());
        r.inventory.push("Iron Sword".into());
    });

    h.engine.use_item("knight", "Wooden Sword").await.expect("equip wooden");
    assert_eq!(h.store.get("knight").expect("get").attack, 13);

    let swap = h.engine.use_item("knight", "Iron Sword").await.expect("equip iron");
    assert_eq!(swap.deltas.items_gained, vec!["Wooden Sword".to_string()]);
    let record = h.store.get("knight").expect("get");
    assert_eq!(record.attack, 18);
    assert_eq!(record.inventory, vec!["Wooden Sword".to_string()]);
    assert_eq!(record.equipped[&EquipSlot::Weapon].name, "Iron Sword");

    h.engine.unequip("knight", EquipSlot::Weapon).await.expect("unequip");
    let record = h.store.get("knight").expect("get");
    assert_eq!(record.attack, 10);
    assert!(record.equipped.is_empty());
    assert_eq!(record.inventory.len(), 2);
}

#[tokio::test]
async fn potions_are_kept_when_they_cannot_help() {
    let h = common::memory_harness(16);
    h.engine.start("healthy").await.expect("start");
    common::edit_record(&h.store, "healthy", |r| r.inventory.push("Health Potion".into()));

    let result = h.engine.use_item("healthy", "Health Potion").await.expect("use");
    assert!(!result.success);
    assert_eq!(h.store.get("healthy").expect("get").inventory.len(), 1);

    common::edit_record(&h.store, "healthy", |r| r.hp = 20);
    let result = h.engine.use_item("healthy", "Health Potion").await.expect("use");
    assert!(result.success);
    let record = h.store.get("healthy").expect("get");
    assert!(record.inventory.is_empty());
    assert!((20 + 45..=20 + 60).contains(&record.hp));
}

#[tokio::test]
async fn scrolls_grant_xp_and_can_level() {
    let h = common::memory_harness(17);
    h.engine.start("scholar").await.expect("start");
    common::edit_record(&h.store, "scholar", |r| {
        r.xp = 99;
        r.inventory.push("Ancient Scroll".into());
    });
    let result = h.engine.use_item("scholar", "Ancient Scroll").await.expect("use");
    assert!((50..=150).contains(&result.deltas.xp_gained));
    let level_up = result.level_up.expect("level up");
    assert_eq!(level_up.new_level, 2);
    let record = h.store.get("scholar").expect("get");
    assert!(record.xp < record.xp_threshold);
}
