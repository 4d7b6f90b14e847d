//! LXC/Docker kernel support: config requirements and source patches.
//!
//! The config side enforces the option set the lxc-docker images expect.
//! The source side carries two small C patches that upstream Android trees
//! need: a kernfs symlink shim in `cgroup_add_file` and the removal of the
//! dead per-device stats path in `xt_qtaguid`. Both exist as Coccinelle
//! patches too (`patch_cocci`), downloaded from the mirror and applied with
//! spatch for trees where the plain text insertion is too brittle.

use crate::download;
use crate::error::{ConfigError, PatchError};
use crate::features::{apply_spatch, require_tool};
use crate::kconfig::{check_requirements, ConfigFile};
use crate::models::{CheckMode, CheckOutcome, Requirements};
use crate::settings::Settings;
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options that must be enabled for LXC/Docker.
/// Mirrors the lxc-docker project's check list, duplicates included.
pub const CONFIGS_ON: &[&str] = &[
    "CONFIG_NAMESPACES",
    "CONFIG_MULTIUSER",
    "CONFIG_NET",
    "CONFIG_NET_NS",
    "CONFIG_PID_NS",
    "CONFIG_POSIX_MQUEUE",
    "CONFIG_IPC_NS",
    "CONFIG_UTS_NS",
    "CONFIG_CGROUPS",
    "CONFIG_SCHED_AUTOGROUP",
    "CONFIG_CGROUP_CPUACCT",
    "CONFIG_CGROUP_DEVICE",
    "CONFIG_CGROUP_FREEZER",
    "CONFIG_CGROUP_SCHED",
    "CONFIG_DEBUG_BLK_CGROUP",
    "CONFIG_NETFILTER_XT_MATCH_BPF",
    "CONFIG_CPUSETS",
    "CONFIG_MEMCG",
    "CONFIG_KEYS",
    "CONFIG_NETDEVICES",
    "CONFIG_NET_CORE",
    "CONFIG_VETH",
    "CONFIG_IPV6",
    "CONFIG_IP6_NF_NAT",
    "CONFIG_IP6_NF_TARGET_MASQUERADE",
    "CONFIG_BRIDGE",
    "CONFIG_NETFILTER",
    "CONFIG_INET",
    "CONFIG_NETFILTER_ADVANCED",
    "CONFIG_BRIDGE_NETFILTER",
    "CONFIG_IP_NF_FILTER",
    "CONFIG_IP_NF_IPTABLES",
    "CONFIG_IP_NF_NAT",
    "CONFIG_IP_NF_TARGET_MASQUERADE",
    "CONFIG_NETFILTER_XTABLES",
    "CONFIG_NETFILTER_XT_MATCH_ADDRTYPE",
    "CONFIG_NETFILTER_XT_MATCH_CONNTRACK",
    "CONFIG_NF_CONNTRACK",
    "CONFIG_NETFILTER_XT_MATCH_IPVS",
    "CONFIG_IP_VS",
    "CONFIG_NETFILTER_XT_MARK",
    "CONFIG_NF_NAT",
    "CONFIG_POSIX_MQUEUE",
    "CONFIG_NF_NAT_IPV6",
    "CONFIG_NF_NAT_IPV4",
    "CONFIG_NF_CONNTRACK_IPV4",
    "CONFIG_NF_CONNTRACK_IPV6",
    "CONFIG_NF_NAT_NEEDED",
    "CONFIG_BPF",
    "CONFIG_CGROUP_BPF",
    "CONFIG_BPF_SYSCALL",
    "CONFIG_USER_NS",
    "CONFIG_SECCOMP",
    "CONFIG_SECCOMP_FILTER",
    "CONFIG_CGROUP_PIDS",
    "CONFIG_CGROUP_DEBUG",
    "CONFIG_SWAP",
    "CONFIG_MEMCG_SWAP",
    "CONFIG_MEMCG_SWAP_ENABLED",
    "CONFIG_BLOCK",
    "CONFIG_IOSCHED_CFQ",
    "CONFIG_BLK_CGROUP",
    "CONFIG_CFQ_GROUP_IOSCHED",
    "CONFIG_BLK_DEV_THROTTLING",
    "CONFIG_PERF_EVENTS",
    "CONFIG_CGROUP_PERF",
    "CONFIG_HUGETLBFS",
    "CONFIG_HUGETLB_PAGE",
    "CONFIG_CGROUP_HUGETLB",
    "CONFIG_NET_SCHED",
    "CONFIG_NET_CLS_CGROUP",
    "CONFIG_CGROUP_NET_PRIO",
    "CONFIG_FAIR_GROUP_SCHED",
    "CONFIG_RT_GROUP_SCHED",
    "CONFIG_IP_NF_TARGET_REDIRECT",
    "CONFIG_IP_VS_NFCT",
    "CONFIG_IP_VS_PROTO_TCP",
    "CONFIG_IP_VS_PROTO_UDP",
    "CONFIG_IP_VS_RR",
    "CONFIG_SECURITY",
    "CONFIG_SECURITY_SELINUX",
    "CONFIG_SECURITY_APPARMOR",
    "CONFIG_EXT3_FS",
    "CONFIG_EXT3_FS_POSIX_ACL",
    "CONFIG_EXT3_FS_SECURITY",
    "CONFIG_EXT4_FS",
    "CONFIG_EXT4_FS_POSIX_ACL",
    "CONFIG_EXT4_FS_SECURITY",
    "CONFIG_VXLAN",
    "CONFIG_BRIDGE",
    "CONFIG_BRIDGE_VLAN_FILTERING",
    "CONFIG_VLAN_8021Q",
    "CONFIG_CRYPTO",
    "CONFIG_CRYPTO_AEAD",
    "CONFIG_CRYPTO_GCM",
    "CONFIG_CRYPTO_SEQIV",
    "CONFIG_CRYPTO_GHASH",
    "CONFIG_CHECKPOINT_RESTORE",
    "CONFIG_XFRM",
    "CONFIG_XFRM_USER",
    "CONFIG_XFRM_ALGO",
    "CONFIG_INET_ESP",
    "CONFIG_INET_XFRM_MODE_TRANSPORT",
    "CONFIG_IPVLAN",
    "CONFIG_MACVLAN",
    "CONFIG_NET_L3_MASTER_DEV",
    "CONFIG_DUMMY",
    "CONFIG_NF_NAT_FTP",
    "CONFIG_NF_CONNTRACK_FTP",
    "CONFIG_NF_NAT_TFTP",
    "CONFIG_NF_CONNTRACK_TFTP",
    "CONFIG_AUFS_FS",
    "CONFIG_BTRFS_FS",
    "CONFIG_BTRFS_FS_POSIX_ACL",
    "CONFIG_MD",
    "CONFIG_BLK_DEV_DM",
    "CONFIG_DM_THIN_PROVISIONING",
    "CONFIG_OVERLAY_FS",
    "CONFIG_PACKET",
    "CONFIG_PACKET_DIAG",
    "CONFIG_NETLINK_DIAG",
    "CONFIG_FHANDLE",
    "CONFIG_UNIX",
    "CONFIG_UNIX_DIAG",
    "CONFIG_NETFILTER_XT_TARGET_CHECKSUM",
    "CONFIG_CFS_BANDWIDTH",
];

/// Options that must be disabled for LXC/Docker.
pub const CONFIGS_OFF: &[&str] = &["CONFIG_ANDROID_PARANOID_NETWORK", "CONFIG_SCHED_WALT"];

pub fn requirements() -> Requirements {
    Requirements {
        enable: CONFIGS_ON,
        disable: CONFIGS_OFF,
        exact: &[],
    }
}

/// Check (and optionally fix) a kernel config for LXC/Docker support.
pub fn check_config(config_path: &Path, mode: CheckMode) -> Result<CheckOutcome, ConfigError> {
    let mut config = ConfigFile::load_within_cwd(config_path)?;

    println!("\n\nChecking config file for https://github.com/wu17481748/lxc-docker specific config options.\n\n");

    let outcome = check_requirements(&mut config, &requirements(), mode)?;

    if outcome.fixes > 0 {
        println!("{}", format!("开启docker-lxc配置 {} 项.\n\n", outcome.fixes).green());
    }
    Ok(outcome)
}

/// Pick the cgroup source file for this tree. Older trees keep
/// `cgroup_add_file` in kernel/cgroup.c, newer ones in kernel/cgroup/.
pub fn find_cgroup_file(kernel_dir: &Path) -> PathBuf {
    let old_path = kernel_dir.join("kernel/cgroup.c");
    if old_path.exists() {
        if let Ok(content) = fs::read_to_string(&old_path) {
            if content.contains("int cgroup_add_file") {
                return old_path;
            }
        }
    }
    kernel_dir.join("kernel/cgroup/cgroup.c")
}

fn cgroup_already_patched(content: &str) -> bool {
    content.contains("snprintf(name, CGROUP_FILE_NAME_MAX")
}

fn netfilter_already_patched(content: &str) -> bool {
    content.contains("struct rtnl_link_stats64 *stats")
}

/// Insert the kernfs symlink shim into `cgroup_add_file`.
///
/// Tracks brace depth from the function head and inserts the snippet just
/// before the function's `return 0;`, matching its indentation. Returns
/// `None` when no insertion point exists.
pub fn patch_cgroup_source(content: &str) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    let mut in_function = false;
    let mut brace_depth: i32 = 0;
    let mut inserted = false;

    for line in content.lines() {
        let stripped = line.trim();

        if stripped.contains("int cgroup_add_file") {
            in_function = true;
        }

        if in_function && !inserted {
            brace_depth += stripped.matches('{').count() as i32;
            brace_depth -= stripped.matches('}').count() as i32;

            if stripped == "return 0;" && brace_depth > 0 {
                let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                out.push(format!(
                    "{}if (cft->ss && (cgrp->root->flags & CGRP_ROOT_NOPREFIX) && !(cft->flags & CFTYPE_NO_PREFIX)) {{",
                    indent
                ));
                out.push(format!(
                    "{}    snprintf(name, CGROUP_FILE_NAME_MAX, \"%s.%s\", cft->ss->name, cft->name);",
                    indent
                ));
                out.push(format!("{}    kernfs_create_link(cgrp->kn, name, kn);", indent));
                out.push(format!("{}}}", indent));
                inserted = true;
            }
        }

        out.push(line.to_string());
    }

    if inserted {
        Some(out.join("\n"))
    } else {
        None
    }
}

/// Rewrite `iface_stat_fmt_proc_show` to always use the zeroed device stats.
///
/// Replaces the `dev_stats, *stats` declaration with a bare pointer and
/// collapses the `if (iface_entry->active)` block (the line plus the five
/// following it) into a single `stats = &no_dev_stats;` assignment. Returns
/// `None` when the expected shape is not found.
pub fn patch_netfilter_source(content: &str) -> Option<String> {
    let mut out: Vec<String> = Vec::new();
    let mut in_function = false;
    let mut modified = false;
    let mut skip_lines = 0usize;

    for line in content.lines() {
        if skip_lines > 0 {
            skip_lines -= 1;
            continue;
        }

        let stripped = line.trim();
        if stripped.contains("int iface_stat_fmt_proc_show") {
            in_function = true;
        }

        let mut line = line.to_string();
        if in_function && !modified {
            if line.contains("struct rtnl_link_stats64 dev_stats, *stats") {
                line = line.replace(
                    "struct rtnl_link_stats64 dev_stats, *stats",
                    "struct rtnl_link_stats64 *stats",
                );
            }

            if line.contains("if (iface_entry->active)") {
                let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                out.push(format!("{}stats = &no_dev_stats;", indent));
                skip_lines = 5;
                modified = true;
                continue;
            }
        }

        out.push(line);
    }

    if modified {
        Some(out.join("\n"))
    } else {
        None
    }
}

/// Apply both LXC source patches to a kernel tree.
///
/// Missing target files and already-patched files are skipped with a
/// warning, matching how the patches behave across the zoo of vendor trees.
pub fn patch(kernel_dir: &Path) -> Result<(), PatchError> {
    let cgroup_file = find_cgroup_file(kernel_dir);
    let netfilter_file = kernel_dir.join("net/netfilter/xt_qtaguid.c");

    if !cgroup_file.exists() {
        log::warn!("{} not found, skipping", cgroup_file.display());
    } else {
        let content = fs::read_to_string(&cgroup_file)?;
        if cgroup_already_patched(&content) {
            log::warn!(
                "{} already contains LXC patches, skipping",
                cgroup_file.display()
            );
        } else {
            match patch_cgroup_source(&content) {
                Some(patched) => {
                    fs::write(&cgroup_file, patched)?;
                    println!("Patch applied successfully to {}", cgroup_file.display());
                }
                None => log::warn!(
                    "Could not find insertion point in {}",
                    cgroup_file.display()
                ),
            }
        }
    }

    if !netfilter_file.exists() {
        log::warn!("{} not found, skipping", netfilter_file.display());
    } else {
        let content = fs::read_to_string(&netfilter_file)?;
        if netfilter_already_patched(&content) {
            log::warn!(
                "{} already contains LXC patches, skipping",
                netfilter_file.display()
            );
        } else {
            match patch_netfilter_source(&content) {
                Some(patched) => {
                    fs::write(&netfilter_file, patched)?;
                    println!("Patch applied successfully to {}", netfilter_file.display());
                }
                None => log::warn!("Could not apply netfilter patch"),
            }
        }
    }

    Ok(())
}

/// Download the LXC Coccinelle patch pair and apply them with spatch.
pub async fn patch_cocci(kernel_dir: &Path, settings: &Settings) -> crate::error::Result<()> {
    require_tool("spatch")?;

    let cgroup_target = find_cgroup_file(kernel_dir);
    let patches = [
        ("cgroup.cocci", cgroup_target),
        (
            "xt_qtaguid.cocci",
            kernel_dir.join("net/netfilter/xt_qtaguid.c"),
        ),
    ];

    let temp_dir = tempfile::tempdir()?;
    println!("Downloading patches...");
    let jobs: Vec<(String, PathBuf)> = patches
        .iter()
        .map(|(name, _)| {
            (
                format!("{}/lxc/{}", settings.mirror_base, name),
                temp_dir.path().join(name),
            )
        })
        .collect();
    download::fetch_all(&jobs).await?;

    println!("Applying patches...");
    for (name, target) in &patches {
        let cocci_file = temp_dir.path().join(name);
        apply_spatch(&cocci_file, target, &[], false)?;
    }

    println!("All patches processed successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CGROUP_SNIPPET: &str = r#"static int cgroup_add_file(struct cgroup *cgrp, struct cftype *cft)
{
	char name[CGROUP_FILE_NAME_MAX];
	struct kernfs_node *kn;

	kn = __kernfs_create_file(cgrp->kn, cgroup_file_name(cgrp, cft, name));
	if (IS_ERR(kn))
		return PTR_ERR(kn);
	return 0;
}
"#;

    #[test]
    fn test_cgroup_patch_inserts_before_return() {
        let patched = patch_cgroup_source(CGROUP_SNIPPET).expect("should patch");
        let return_pos = patched.find("\treturn 0;").unwrap();
        let link_pos = patched.find("kernfs_create_link").unwrap();
        assert!(link_pos < return_pos);
        assert!(cgroup_already_patched(&patched));
    }

    #[test]
    fn test_cgroup_patch_preserves_indentation() {
        let patched = patch_cgroup_source(CGROUP_SNIPPET).unwrap();
        assert!(patched.contains("\tif (cft->ss && (cgrp->root->flags & CGRP_ROOT_NOPREFIX)"));
        assert!(patched.contains("\t    kernfs_create_link(cgrp->kn, name, kn);"));
    }

    #[test]
    fn test_cgroup_patch_without_function_is_none() {
        assert!(patch_cgroup_source("int unrelated(void)\n{\n\treturn 0;\n}\n").is_none());
    }

    #[test]
    fn test_netfilter_patch_collapses_active_branch() {
        let source = "\
static int iface_stat_fmt_proc_show(struct seq_file *m, void *p)
{
	struct rtnl_link_stats64 dev_stats, *stats;

	if (iface_entry->active) {
		stats = dev_get_stats(iface_entry->net_dev,
				      &dev_stats);
	} else {
		stats = &no_dev_stats;
	}
	seq_printf(m, \"%s\", iface_entry->ifname);
}
";
        let patched = patch_netfilter_source(source).expect("should patch");
        assert!(patched.contains("struct rtnl_link_stats64 *stats;"));
        assert!(patched.contains("\tstats = &no_dev_stats;"));
        assert!(!patched.contains("if (iface_entry->active)"));
        assert!(!patched.contains("dev_get_stats"));
        assert!(patched.contains("seq_printf"));
    }

    #[test]
    fn test_netfilter_patch_without_function_is_none() {
        assert!(patch_netfilter_source("int unrelated(void) { return 1; }\n").is_none());
    }

    #[test]
    fn test_patch_skips_already_patched_tree() {
        let temp_dir = tempfile::tempdir().unwrap();
        let kernel_dir = temp_dir.path();
        fs::create_dir_all(kernel_dir.join("kernel/cgroup")).unwrap();

        let patched_once = patch_cgroup_source(CGROUP_SNIPPET).unwrap();
        fs::write(kernel_dir.join("kernel/cgroup/cgroup.c"), &patched_once).unwrap();

        patch(kernel_dir).unwrap();
        let after = fs::read_to_string(kernel_dir.join("kernel/cgroup/cgroup.c")).unwrap();
        assert_eq!(after, patched_once);
    }

    #[test]
    fn test_find_cgroup_file_prefers_legacy_location() {
        let temp_dir = tempfile::tempdir().unwrap();
        let kernel_dir = temp_dir.path();
        fs::create_dir_all(kernel_dir.join("kernel")).unwrap();
        fs::write(
            kernel_dir.join("kernel/cgroup.c"),
            "int cgroup_add_file(void);\n",
        )
        .unwrap();
        assert_eq!(
            find_cgroup_file(kernel_dir),
            kernel_dir.join("kernel/cgroup.c")
        );
    }

    #[test]
    fn test_find_cgroup_file_falls_back_to_modern_location() {
        let temp_dir = tempfile::tempdir().unwrap();
        let kernel_dir = temp_dir.path();
        assert_eq!(
            find_cgroup_file(kernel_dir),
            kernel_dir.join("kernel/cgroup/cgroup.c")
        );
    }

    #[test]
    fn test_requirements_shape() {
        let reqs = requirements();
        assert!(reqs.enable.contains(&"CONFIG_VETH"));
        assert!(reqs.disable.contains(&"CONFIG_ANDROID_PARANOID_NETWORK"));
        assert!(reqs.exact.is_empty());
    }
}
