//! List 802.15.4 PHYs and the interfaces bound to them.
//!
//! Run with: cargo run -p wpan-nlink --example list_devices
//!
//! Note: Requires the ieee802154 stack. A fake radio can be created with:
//!   sudo modprobe mac802154_hwsim

use wpan_nlink::netlink::genl::nl802154::{
    Nl802154Cmd, Nl802154Connection, WpanInterface, WpanPhy, channel_frequency, iftype_name,
};

#[tokio::main]
async fn main() -> wpan_nlink::Result<()> {
    let conn = match Nl802154Connection::new().await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("Failed to resolve nl802154: {}", e);
            eprintln!("Try: sudo modprobe mac802154_hwsim");
            return Ok(());
        }
    };

    println!("=== PHYs ===\n");

    // Large PHYs are split over several dump messages.
    let mut phys: Vec<WpanPhy> = Vec::new();
    for msg in conn.execute(conn.new_request(Nl802154Cmd::GetWpanPhy, true)).await? {
        let phy = WpanPhy::parse(&msg.attrs)?;
        match phys.iter_mut().find(|p| p.index == phy.index) {
            Some(existing) => existing.merge(phy),
            None => phys.push(phy),
        }
    }

    for phy in &phys {
        print!("{}", phy.name.as_deref().unwrap_or("?"));
        if let (Some(page), Some(channel)) = (phy.page, phy.channel) {
            print!(": page {} channel {}", page, channel);
            if let Some(freq) = channel_frequency(page, channel) {
                print!(" ({}.{} MHz)", freq / 10, freq % 10);
            }
        }
        println!();
    }

    println!("\n=== Interfaces ===\n");

    for msg in conn.execute(conn.new_request(Nl802154Cmd::GetInterface, true)).await? {
        let iface = WpanInterface::parse(&msg.attrs)?;
        println!(
            "{} on phy#{}: type {}, pan_id {:?}",
            iface.ifname.as_deref().unwrap_or("?"),
            iface.wpan_phy.unwrap_or_default(),
            iface.iftype.map(iftype_name).unwrap_or_default(),
            iface.pan_id,
        );
    }

    Ok(())
}
