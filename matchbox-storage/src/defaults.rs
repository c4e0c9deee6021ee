use crate::resources::Template;
use crate::store::Store;

const DEFAULT_IPXE: &str = r##"#!ipxe
kernel {{kernel}}{{#each args}} {{this}}{{/each}}
{{#each initrd}}initrd {{this}}
{{/each}}boot
"##;

const DEFAULT_GRUB: &str = r##"default=0
fallback=1
timeout=1
menuentry "CoreOS (EFI)" {
  echo "Loading kernel"
  linuxefi "{{kernel}}"{{#each args}} {{this}}{{/each}}
  echo "Loading initrd"
  initrdefi {{#each initrd}} "{{this}}"{{/each}}
}
menuentry "CoreOS (BIOS)" {
  echo "Loading kernel"
  linux "{{kernel}}"{{#each args}} {{this}}{{/each}}
  echo "Loading initrd"
  initrd {{#each initrd}} "{{this}}"{{/each}}
}
"##;

const DEFAULT_IGNITION: &str = r##"{
  "ignition": { "version": "2.2.0" },
  "passwd": {
    "users": [
      {
        "name": "core",
        "sshAuthorizedKeys": [
          {{#each ssh_authorized_keys}}"ssh-rsa {{this}}"{{#unless @last}},{{/unless}}
          {{/each}}
        ]
      }
    ]
  }
}
"##;

/// Seeds the reserved `default-ipxe`, `default-grub`, and `default-ignition`
/// templates when absent, so Profiles binding a role to a default id always
/// resolve. Best-effort: failures are logged and do not abort startup.
pub async fn assert_default_templates(store: &dyn Store) {
    let defaults = [
        ("default-ipxe", "Default iPXE boot configuration", DEFAULT_IPXE),
        ("default-grub", "Default GRUB template", DEFAULT_GRUB),
        ("default-ignition", "Default Ignition configuration", DEFAULT_IGNITION),
    ];
    for (id, name, contents) in defaults {
        if store.template_get(id).await.is_ok() {
            continue;
        }
        let template = Template {
            id: id.to_string(),
            name: name.to_string(),
            contents: contents.as_bytes().to_vec(),
        };
        if let Err(err) = store.template_put(template).await {
            tracing::warn!(template = id, %err, "failed to seed default template");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;

    #[tokio::test]
    async fn seeds_all_three_defaults() {
        let store = MemoryStore::new();
        assert_default_templates(&store).await;
        for id in ["default-ipxe", "default-grub", "default-ignition"] {
            let template = store.template_get(id).await.unwrap();
            assert!(!template.contents.is_empty(), "{id} must have a body");
        }
    }

    #[tokio::test]
    async fn seeding_does_not_clobber_existing_templates() {
        let store = MemoryStore::new();
        let custom = Template {
            id: "default-ipxe".to_string(),
            name: String::new(),
            contents: b"#!ipxe\ncustom\n".to_vec(),
        };
        store.template_put(custom.clone()).await.unwrap();
        assert_default_templates(&store).await;
        assert_eq!(store.template_get("default-ipxe").await.unwrap(), custom);
    }
}
