use dclocate_domain::{flag_names, DomainControllerInfo, SrvCandidate};
use std::io::{self, Write};

pub fn print_dc_info(info: &DomainControllerInfo, json: bool) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, info)?;
        writeln!(out)?;
        return Ok(());
    }

    let or_dash = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());

    writeln!(out, "DC name:      {}", info.domain_controller_name)?;
    writeln!(out, "DC address:   {}", info.address_unc())?;
    writeln!(out, "Address type: {:?}", info.domain_controller_address_type)?;
    writeln!(out, "Domain GUID:  {}", info.domain_guid)?;
    writeln!(out, "Domain:       {}", or_dash(&info.domain_name))?;
    writeln!(out, "Forest:       {}", or_dash(&info.dns_forest_name))?;
    writeln!(out, "DC site:      {}", or_dash(&info.dc_site_name))?;
    writeln!(out, "Client site:  {}", or_dash(&info.client_site_name))?;
    writeln!(
        out,
        "Flags:        0x{:08x} {}",
        info.flags,
        flag_names(info.flags).join(" ")
    )?;
    Ok(())
}

pub fn print_candidates(candidates: &[SrvCandidate], json: bool) -> anyhow::Result<()> {
    let mut out = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, candidates)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "{:<40} {:>5} {:>8} {:>6}  ADDRESS",
        "TARGET", "PORT", "PRIORITY", "WEIGHT"
    )?;
    for c in candidates {
        let address = c
            .display_address()
            .map(|a| a.to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            out,
            "{:<40} {:>5} {:>8} {:>6}  {}",
            c.target_name, c.port, c.priority, c.weight, address
        )?;
    }
    Ok(())
}
